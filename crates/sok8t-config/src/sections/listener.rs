// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Listener configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 10;

/// Listener configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerConfig {
	/// Local port the dual-stack listener binds on all interfaces.
	pub port: u16,
	/// How long shutdown waits for in-flight sessions to reap their workloads.
	pub drain_timeout: Duration,
}

impl Default for ListenerConfig {
	fn default() -> Self {
		Self {
			port: DEFAULT_PORT,
			drain_timeout: Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS),
		}
	}
}

/// Listener configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListenerConfigLayer {
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub drain_timeout_secs: Option<u64>,
}

impl ListenerConfigLayer {
	pub fn merge(&mut self, other: ListenerConfigLayer) {
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.drain_timeout_secs.is_some() {
			self.drain_timeout_secs = other.drain_timeout_secs;
		}
	}

	pub fn finalize(self) -> Result<ListenerConfig, ConfigError> {
		let port = self.port.unwrap_or(DEFAULT_PORT);
		if port == 0 {
			return Err(ConfigError::InvalidValue {
				key: "listener.port".to_string(),
				message: "port must be non-zero".to_string(),
			});
		}
		Ok(ListenerConfig {
			port,
			drain_timeout: Duration::from_secs(
				self.drain_timeout_secs.unwrap_or(DEFAULT_DRAIN_TIMEOUT_SECS),
			),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = ListenerConfigLayer::default().finalize().unwrap();
		assert_eq!(config, ListenerConfig::default());
		assert_eq!(config.port, 8000);
	}

	#[test]
	fn test_zero_port_rejected() {
		let layer = ListenerConfigLayer {
			port: Some(0),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = ListenerConfigLayer {
			port: Some(9000),
			drain_timeout_secs: Some(5),
		};
		base.merge(ListenerConfigLayer {
			port: Some(9100),
			drain_timeout_secs: None,
		});
		assert_eq!(base.port, Some(9100));
		assert_eq!(base.drain_timeout_secs, Some(5));
	}
}
