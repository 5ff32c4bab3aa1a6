// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workload configuration section.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_DELETE_GRACE_PERIOD_SECS: u32 = 5;

/// Container image pull policy, propagated verbatim to the pod spec.
///
/// Parsing ignores case in every source (TOML, environment, command line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ImagePullPolicy {
	Always,
	IfNotPresent,
	Never,
}

impl ImagePullPolicy {
	pub fn as_str(&self) -> &'static str {
		match self {
			ImagePullPolicy::Always => "Always",
			ImagePullPolicy::IfNotPresent => "IfNotPresent",
			ImagePullPolicy::Never => "Never",
		}
	}
}

impl fmt::Display for ImagePullPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ImagePullPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"always" => Ok(ImagePullPolicy::Always),
			"ifnotpresent" => Ok(ImagePullPolicy::IfNotPresent),
			"never" => Ok(ImagePullPolicy::Never),
			_ => Err(format!(
				"unknown pull policy '{s}' (expected Always, IfNotPresent or Never)"
			)),
		}
	}
}

impl TryFrom<String> for ImagePullPolicy {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// Workload configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadConfig {
	/// Namespace all workloads are created in and swept from.
	pub namespace: String,
	/// Container image each workload runs.
	pub image: String,
	/// Port inside the workload the bridge connects to.
	pub target_port: u16,
	/// Name of a docker-registry secret for private images.
	pub image_pull_secret: Option<String>,
	pub image_pull_policy: Option<ImagePullPolicy>,
	pub delete_grace_period_secs: u32,
}

/// Workload configuration layer (for merging).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WorkloadConfigLayer {
	#[serde(default)]
	pub namespace: Option<String>,
	#[serde(default)]
	pub image: Option<String>,
	#[serde(default)]
	pub target_port: Option<u16>,
	#[serde(default)]
	pub image_pull_secret: Option<String>,
	#[serde(default)]
	pub image_pull_policy: Option<ImagePullPolicy>,
	#[serde(default)]
	pub delete_grace_period_secs: Option<u32>,
}

impl WorkloadConfigLayer {
	/// Merges another layer on top of this one.
	/// Values from `other` take precedence when present.
	pub fn merge(&mut self, other: WorkloadConfigLayer) {
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.image.is_some() {
			self.image = other.image;
		}
		if other.target_port.is_some() {
			self.target_port = other.target_port;
		}
		if other.image_pull_secret.is_some() {
			self.image_pull_secret = other.image_pull_secret;
		}
		if other.image_pull_policy.is_some() {
			self.image_pull_policy = other.image_pull_policy;
		}
		if other.delete_grace_period_secs.is_some() {
			self.delete_grace_period_secs = other.delete_grace_period_secs;
		}
	}

	pub fn finalize(self) -> Result<WorkloadConfig, ConfigError> {
		let namespace = non_empty(self.namespace).ok_or(ConfigError::Missing("namespace"))?;
		let image = non_empty(self.image).ok_or(ConfigError::Missing("image"))?;
		let target_port = self.target_port.ok_or(ConfigError::Missing("target_port"))?;
		if target_port == 0 {
			return Err(ConfigError::InvalidValue {
				key: "workload.target_port".to_string(),
				message: "port must be non-zero".to_string(),
			});
		}

		Ok(WorkloadConfig {
			namespace,
			image,
			target_port,
			image_pull_secret: non_empty(self.image_pull_secret),
			image_pull_policy: self.image_pull_policy,
			delete_grace_period_secs: self
				.delete_grace_period_secs
				.unwrap_or(DEFAULT_DELETE_GRACE_PERIOD_SECS),
		})
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
}
