// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the sok8t workload bridge.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file,
//!   environment, command line)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SOK8T_*`)
//!
//! # Usage
//!
//! ```ignore
//! use sok8t_config::{load_config, ServerConfigLayer};
//!
//! let config = load_config(None, ServerConfigLayer::default())?;
//! println!("listening on port {}", config.listener.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::path::Path;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, LayerSource, Precedence, TomlSource};

use tracing::debug;

/// Fully resolved, immutable process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub listener: ListenerConfig,
	pub workload: WorkloadConfig,
	pub readiness: ReadinessConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Command-line flags (`cli`)
/// 2. Environment variables (`SOK8T_*`)
/// 3. Config file given with `--config`, then `/etc/sok8t/sok8t.toml`
/// 4. Built-in defaults
pub fn load_config(
	config_file: Option<&Path>,
	cli: ServerConfigLayer,
) -> Result<ServerConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> =
		vec![Box::new(DefaultsSource), Box::new(TomlSource::system())];
	if let Some(path) = config_file {
		sources.push(Box::new(TomlSource::new(path)));
	}
	sources.push(Box::new(EnvSource));
	sources.push(Box::new(LayerSource::command_line(cli)));

	load_from_sources(sources)
}

/// Merge the given sources in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	let config = merged.finalize()?;
	debug!(
		port = config.listener.port,
		namespace = %config.workload.namespace,
		image = %config.workload.image,
		target_port = config.workload.target_port,
		"configuration loaded"
	);
	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn workload_layer(namespace: &str, port: u16) -> ServerConfigLayer {
		ServerConfigLayer {
			workload: Some(WorkloadConfigLayer {
				namespace: Some(namespace.to_string()),
				image: Some("nginx".to_string()),
				target_port: Some(port),
				..Default::default()
			}),
			..Default::default()
		}
	}

	struct FileLayer(ServerConfigLayer);

	impl ConfigSource for FileLayer {
		fn name(&self) -> &'static str {
			"test-file"
		}

		fn precedence(&self) -> Precedence {
			Precedence::ConfigFile
		}

		fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
			Ok(self.0.clone())
		}
	}

	#[test]
	fn test_command_line_overrides_file_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(LayerSource::command_line(workload_layer("from-cli", 80))),
			Box::new(FileLayer(workload_layer("from-file", 8080))),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.workload.namespace, "from-cli");
		assert_eq!(config.workload.target_port, 80);
		assert_eq!(config.listener.port, 8000);
	}

	#[test]
	fn test_file_values_survive_partial_override() {
		let mut file = workload_layer("from-file", 8080);
		file.workload.as_mut().unwrap().image_pull_secret = Some("regcred".to_string());

		let cli = ServerConfigLayer {
			workload: Some(WorkloadConfigLayer {
				target_port: Some(9090),
				..Default::default()
			}),
			..Default::default()
		};

		let config = load_from_sources(vec![
			Box::new(FileLayer(file)),
			Box::new(LayerSource::command_line(cli)),
		])
		.unwrap();

		assert_eq!(config.workload.namespace, "from-file");
		assert_eq!(config.workload.target_port, 9090);
		assert_eq!(config.workload.image_pull_secret.as_deref(), Some("regcred"));
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn later_layer_wins_when_set(base in proptest::option::of(1u16..), top in proptest::option::of(1u16..)) {
			let mut merged = ListenerConfigLayer { port: base, ..Default::default() };
			merged.merge(ListenerConfigLayer { port: top, ..Default::default() });
			prop_assert_eq!(merged.port, top.or(base));
		}
	}
}
