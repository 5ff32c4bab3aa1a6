// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sections::{
	ListenerConfigLayer, LoggingConfigLayer, ReadinessConfigLayer, WorkloadConfigLayer,
};
use crate::ServerConfig;

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub listener: Option<ListenerConfigLayer>,
	#[serde(default)]
	pub workload: Option<WorkloadConfigLayer>,
	#[serde(default)]
	pub readiness: Option<ReadinessConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.listener, other.listener, ListenerConfigLayer::merge);
		merge_option(&mut self.workload, other.workload, WorkloadConfigLayer::merge);
		merge_option(
			&mut self.readiness,
			other.readiness,
			ReadinessConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}

	/// Resolve defaults and validate required settings.
	pub fn finalize(self) -> Result<ServerConfig, ConfigError> {
		Ok(ServerConfig {
			listener: self.listener.unwrap_or_default().finalize()?,
			workload: self.workload.unwrap_or_default().finalize()?,
			readiness: self.readiness.unwrap_or_default().finalize()?,
			logging: self.logging.unwrap_or_default().finalize(),
		})
	}
}

fn merge_option<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(b), Some(o)) => merge(b, o),
		(None, Some(o)) => *base = Some(o),
		_ => {}
	}
}
