// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! sok8t server binary.

use std::sync::Arc;

use clap::Parser;
use sok8t_config::LoggingConfig;
use sok8t_k8s::{K8sClient, KubeClient};
use sok8t_server::{reaper, Server, SessionContext};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod version;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let config = sok8t_config::load_config(args.config.as_deref(), args.to_layer())?;
	init_tracing(&config.logging);

	tracing::info!(
		port = config.listener.port,
		namespace = %config.workload.namespace,
		image = %config.workload.image,
		target_port = config.workload.target_port,
		"starting sok8t"
	);

	let client: Arc<dyn K8sClient> = Arc::new(KubeClient::new().await?);

	let namespace = &config.workload.namespace;
	if let Err(e) = client.get_namespace(namespace).await {
		tracing::warn!(namespace = %namespace, error = %e, "workload namespace could not be verified");
	}

	match reaper::sweep(client.as_ref(), &config.workload).await {
		Ok(result) if !result.failed.is_empty() => {
			tracing::warn!(failed = ?result.failed, "some leftover workloads could not be deleted");
		}
		Ok(_) => {}
		Err(e) => tracing::error!(error = %e, "failed to list leftover workloads"),
	}

	let shutdown = CancellationToken::new();
	tokio::spawn(watch_shutdown_signals(shutdown.clone()));

	let ctx = SessionContext::new(client, Arc::new(config), shutdown);
	let server = Server::bind(ctx)?;
	server.run().await;

	tracing::info!("sok8t shutdown complete");
	Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);
	if logging.json {
		registry.with(tracing_subscriber::fmt::layer().json()).init();
	} else {
		registry.with(tracing_subscriber::fmt::layer()).init();
	}
}

async fn watch_shutdown_signals(shutdown: CancellationToken) {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		use tokio::signal::unix::{signal, SignalKind};
		match signal(SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {}
		_ = terminate => {}
	}

	tracing::info!("Received shutdown signal");
	shutdown.cancel();
}
