// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Readiness polling configuration.
//!
//! A timeout of `0` disables the deadline for that phase, so the session
//! waits until process shutdown.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_ADDRESS_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_CONNECT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessConfig {
	pub address_poll_interval: Duration,
	pub connect_poll_interval: Duration,
	pub address_timeout: Option<Duration>,
	pub connect_timeout: Option<Duration>,
}

impl Default for ReadinessConfig {
	fn default() -> Self {
		Self {
			address_poll_interval: Duration::from_millis(DEFAULT_ADDRESS_POLL_INTERVAL_MS),
			connect_poll_interval: Duration::from_millis(DEFAULT_CONNECT_POLL_INTERVAL_MS),
			address_timeout: Some(Duration::from_secs(DEFAULT_PHASE_TIMEOUT_SECS)),
			connect_timeout: Some(Duration::from_secs(DEFAULT_PHASE_TIMEOUT_SECS)),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReadinessConfigLayer {
	#[serde(default)]
	pub address_poll_interval_ms: Option<u64>,
	#[serde(default)]
	pub connect_poll_interval_ms: Option<u64>,
	#[serde(default)]
	pub address_timeout_secs: Option<u64>,
	#[serde(default)]
	pub connect_timeout_secs: Option<u64>,
}

impl ReadinessConfigLayer {
	pub fn merge(&mut self, other: ReadinessConfigLayer) {
		if other.address_poll_interval_ms.is_some() {
			self.address_poll_interval_ms = other.address_poll_interval_ms;
		}
		if other.connect_poll_interval_ms.is_some() {
			self.connect_poll_interval_ms = other.connect_poll_interval_ms;
		}
		if other.address_timeout_secs.is_some() {
			self.address_timeout_secs = other.address_timeout_secs;
		}
		if other.connect_timeout_secs.is_some() {
			self.connect_timeout_secs = other.connect_timeout_secs;
		}
	}

	pub fn finalize(self) -> Result<ReadinessConfig, ConfigError> {
		let address_poll_interval_ms = positive(
			"readiness.address_poll_interval_ms",
			self
				.address_poll_interval_ms
				.unwrap_or(DEFAULT_ADDRESS_POLL_INTERVAL_MS),
		)?;
		let connect_poll_interval_ms = positive(
			"readiness.connect_poll_interval_ms",
			self
				.connect_poll_interval_ms
				.unwrap_or(DEFAULT_CONNECT_POLL_INTERVAL_MS),
		)?;

		Ok(ReadinessConfig {
			address_poll_interval: Duration::from_millis(address_poll_interval_ms),
			connect_poll_interval: Duration::from_millis(connect_poll_interval_ms),
			address_timeout: deadline(self.address_timeout_secs),
			connect_timeout: deadline(self.connect_timeout_secs),
		})
	}
}

fn positive(key: &str, value: u64) -> Result<u64, ConfigError> {
	if value == 0 {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: "interval must be greater than zero".to_string(),
		});
	}
	Ok(value)
}

fn deadline(secs: Option<u64>) -> Option<Duration> {
	match secs.unwrap_or(DEFAULT_PHASE_TIMEOUT_SECS) {
		0 => None,
		secs => Some(Duration::from_secs(secs)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = ReadinessConfigLayer::default().finalize().unwrap();
		assert_eq!(config, ReadinessConfig::default());
		assert_eq!(config.address_poll_interval, Duration::from_millis(100));
		assert_eq!(config.connect_poll_interval, Duration::from_millis(200));
	}

	#[test]
	fn test_zero_timeout_means_unbounded() {
		let layer = ReadinessConfigLayer {
			address_timeout_secs: Some(0),
			connect_timeout_secs: Some(30),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.address_timeout, None);
		assert_eq!(config.connect_timeout, Some(Duration::from_secs(30)));
	}

	#[test]
	fn test_zero_interval_rejected() {
		let layer = ReadinessConfigLayer {
			connect_poll_interval_ms: Some(0),
			..Default::default()
		};
		assert!(layer.finalize().is_err());
	}
}
