// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sok8t_config::{
	ImagePullPolicy, ListenerConfigLayer, LoggingConfigLayer, ReadinessConfigLayer,
	ServerConfigLayer, WorkloadConfigLayer,
};

/// sok8t - spawns a dedicated pod for every TCP connection and bridges to it.
#[derive(Parser, Debug)]
#[command(
	name = "sok8t",
	about = "Connection-triggered ephemeral pod bridge",
	version
)]
pub struct Args {
	#[command(subcommand)]
	pub command: Option<Command>,

	/// TOML configuration file
	#[arg(long, env = "SOK8T_CONFIG")]
	pub config: Option<PathBuf>,

	/// Port to accept client connections on [default: 8000]
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Port the workload container listens on
	#[arg(short, long)]
	pub target_port: Option<u16>,

	/// Namespace workloads are created in
	#[arg(short, long)]
	pub namespace: Option<String>,

	/// Container image for workloads
	#[arg(short, long)]
	pub image: Option<String>,

	/// Name of the image pull secret, if the registry needs one
	#[arg(long)]
	pub image_pull_secret: Option<String>,

	/// Image pull policy (Always, IfNotPresent, Never)
	#[arg(long)]
	pub image_pull_policy: Option<ImagePullPolicy>,

	/// Grace period for workload deletion in seconds [default: 5]
	#[arg(long)]
	pub delete_grace_period_secs: Option<u32>,

	/// Interval between workload address polls in milliseconds [default: 100]
	#[arg(long)]
	pub address_poll_interval_ms: Option<u64>,

	/// Interval between workload connect attempts in milliseconds [default: 200]
	#[arg(long)]
	pub connect_poll_interval_ms: Option<u64>,

	/// Seconds to wait for a workload address, 0 waits forever [default: 120]
	#[arg(long)]
	pub address_timeout_secs: Option<u64>,

	/// Seconds to wait for the workload port, 0 waits forever [default: 120]
	#[arg(long)]
	pub connect_timeout_secs: Option<u64>,

	/// Seconds to wait for sessions on shutdown [default: 10]
	#[arg(long)]
	pub drain_timeout_secs: Option<u64>,

	/// Log filter directive, overridden by RUST_LOG
	#[arg(long)]
	pub log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long)]
	pub log_json: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
	/// Show version and build information
	Version,
}

impl Args {
	/// The command-line configuration layer. Unset flags leave lower layers alone.
	pub fn to_layer(&self) -> ServerConfigLayer {
		ServerConfigLayer {
			listener: Some(ListenerConfigLayer {
				port: self.port,
				drain_timeout_secs: self.drain_timeout_secs,
			}),
			workload: Some(WorkloadConfigLayer {
				namespace: self.namespace.clone(),
				image: self.image.clone(),
				target_port: self.target_port,
				image_pull_secret: self.image_pull_secret.clone(),
				image_pull_policy: self.image_pull_policy,
				delete_grace_period_secs: self.delete_grace_period_secs,
			}),
			readiness: Some(ReadinessConfigLayer {
				address_poll_interval_ms: self.address_poll_interval_ms,
				connect_poll_interval_ms: self.connect_poll_interval_ms,
				address_timeout_secs: self.address_timeout_secs,
				connect_timeout_secs: self.connect_timeout_secs,
			}),
			logging: Some(LoggingConfigLayer {
				level: self.log_level.clone(),
				json: self.log_json.then_some(true),
			}),
		}
	}
}
