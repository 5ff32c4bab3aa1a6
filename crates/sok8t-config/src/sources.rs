// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment and command line.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	ImagePullPolicy, ListenerConfigLayer, LoggingConfigLayer, ReadinessConfigLayer,
	WorkloadConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file that must exist, e.g. one named on the command line.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	/// The system-wide file, skipped when absent.
	pub fn system() -> Self {
		Self {
			path: PathBuf::from("/etc/sok8t/sok8t.toml"),
			required: false,
		}
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: SOK8T_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			listener: Some(ListenerConfigLayer {
				port: env_parse("SOK8T_PORT")?,
				drain_timeout_secs: env_parse("SOK8T_DRAIN_TIMEOUT_SECS")?,
			}),
			workload: Some(WorkloadConfigLayer {
				namespace: env_var("SOK8T_NAMESPACE"),
				image: env_var("SOK8T_IMAGE"),
				target_port: env_parse("SOK8T_TARGET_PORT")?,
				image_pull_secret: env_var("SOK8T_IMAGE_PULL_SECRET"),
				image_pull_policy: env_parse::<ImagePullPolicy>("SOK8T_IMAGE_PULL_POLICY")?,
				delete_grace_period_secs: env_parse("SOK8T_DELETE_GRACE_PERIOD_SECS")?,
			}),
			readiness: Some(ReadinessConfigLayer {
				address_poll_interval_ms: env_parse("SOK8T_ADDRESS_POLL_INTERVAL_MS")?,
				connect_poll_interval_ms: env_parse("SOK8T_CONNECT_POLL_INTERVAL_MS")?,
				address_timeout_secs: env_parse("SOK8T_ADDRESS_TIMEOUT_SECS")?,
				connect_timeout_secs: env_parse("SOK8T_CONNECT_TIMEOUT_SECS")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("SOK8T_LOG_LEVEL"),
				json: env_bool("SOK8T_LOG_JSON"),
			}),
		})
	}
}

/// A pre-built layer, used for values parsed from command-line flags.
pub struct LayerSource {
	name: &'static str,
	precedence: Precedence,
	layer: ServerConfigLayer,
}

impl LayerSource {
	pub fn command_line(layer: ServerConfigLayer) -> Self {
		Self {
			name: "command-line",
			precedence: Precedence::CommandLine,
			layer,
		}
	}
}

impl ConfigSource for LayerSource {
	fn name(&self) -> &'static str {
		self.name
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|e| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid value '{v}': {e}"),
		}),
		None => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_missing_system_file_is_skipped() {
		let source = TomlSource {
			path: PathBuf::from("/nonexistent/sok8t.toml"),
			required: false,
		};
		assert_eq!(source.load().unwrap(), ServerConfigLayer::default());
	}

	#[test]
	fn test_missing_required_file_is_an_error() {
		let source = TomlSource::new("/nonexistent/sok8t.toml");
		assert!(matches!(
			source.load(),
			Err(ConfigError::FileRead { .. })
		));
	}

	#[test]
	fn test_toml_file_is_parsed() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[workload]\nnamespace = \"from-file\"").unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.workload.and_then(|w| w.namespace),
			Some("from-file".to_string())
		);
	}

	#[test]
	fn test_invalid_toml_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[workload\nnamespace = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_parse_rejects_garbage() {
		std::env::set_var("SOK8T_TEST_ONLY_PORT", "eighty");
		let result: Result<Option<u16>, _> = env_parse("SOK8T_TEST_ONLY_PORT");
		std::env::remove_var("SOK8T_TEST_ONLY_PORT");
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
		assert!(Precedence::Environment < Precedence::CommandLine);
	}
}
