// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The lifecycle of one accepted client connection.
//!
//! A session provisions a dedicated workload, waits for it to become
//! reachable, bridges the two connections and finally deletes the workload.
//! Deletion runs on every path, including failures and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use sok8t_config::ServerConfig;
use sok8t_k8s::K8sClient;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::bridge::{self, BridgeStats};
use crate::error::SessionError;
use crate::naming::workload_name;
use crate::provisioner;
use crate::reaper::{self, ReapOutcome};
use crate::readiness::{self, Dialer, TcpDialer};

/// Shared, read-only state every session needs.
#[derive(Clone)]
pub struct SessionContext {
	pub client: Arc<dyn K8sClient>,
	pub dialer: Arc<dyn Dialer>,
	pub config: Arc<ServerConfig>,
	pub shutdown: CancellationToken,
}

impl SessionContext {
	pub fn new(
		client: Arc<dyn K8sClient>,
		config: Arc<ServerConfig>,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			client,
			dialer: Arc::new(TcpDialer),
			config,
			shutdown,
		}
	}

	pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
		self.dialer = dialer;
		self
	}
}

/// How a session ended.
#[derive(Debug)]
pub struct SessionOutcome {
	pub workload: String,
	pub peer: SocketAddr,
	pub result: Result<BridgeStats, SessionError>,
	pub reap: ReapOutcome,
}

impl SessionOutcome {
	pub fn log(&self) {
		match &self.result {
			Ok(stats) => info!(
				workload = %self.workload,
				peer = %self.peer,
				client_to_workload = stats.client_to_workload,
				workload_to_client = stats.workload_to_client,
				reap = ?self.reap,
				"session finished"
			),
			Err(e) if e.is_cancelled() => info!(
				workload = %self.workload,
				peer = %self.peer,
				reap = ?self.reap,
				"session cancelled by shutdown"
			),
			Err(e) => error!(
				workload = %self.workload,
				peer = %self.peer,
				error = %e,
				reap = ?self.reap,
				"session failed"
			),
		}
	}
}

pub struct Session {
	ctx: SessionContext,
	stream: TcpStream,
	peer: SocketAddr,
	workload: String,
}

impl Session {
	pub fn new(ctx: SessionContext, stream: TcpStream, peer: SocketAddr) -> Self {
		let workload = workload_name(&peer);
		Self {
			ctx,
			stream,
			peer,
			workload,
		}
	}

	pub fn workload(&self) -> &str {
		&self.workload
	}

	#[instrument(
		name = "session",
		skip(self),
		fields(workload = %self.workload, peer = %self.peer)
	)]
	pub async fn run(self) -> SessionOutcome {
		let Session {
			ctx,
			stream,
			peer,
			workload,
		} = self;

		let result = establish(&ctx, stream, &peer, &workload).await;

		let workload_config = &ctx.config.workload;
		let reap = reaper::reap(
			ctx.client.as_ref(),
			&workload,
			&workload_config.namespace,
			workload_config.delete_grace_period_secs,
		)
		.await;

		SessionOutcome {
			workload,
			peer,
			result,
			reap,
		}
	}
}

async fn establish(
	ctx: &SessionContext,
	stream: TcpStream,
	peer: &SocketAddr,
	workload: &str,
) -> Result<BridgeStats, SessionError> {
	let config = &ctx.config;

	tokio::select! {
		biased;
		_ = ctx.shutdown.cancelled() => return Err(SessionError::Cancelled),
		created = provisioner::provision(ctx.client.as_ref(), workload, peer, &config.workload) => {
			created?;
		}
	}

	let ip = readiness::wait_for_address(
		ctx.client.as_ref(),
		workload,
		&config.workload.namespace,
		&config.readiness,
		&ctx.shutdown,
	)
	.await?;
	info!(workload = %workload, address = %ip, "workload assigned address");

	let addr = SocketAddr::new(ip, config.workload.target_port);
	let upstream = readiness::wait_for_connection(
		ctx.dialer.as_ref(),
		workload,
		addr,
		&config.readiness,
		&ctx.shutdown,
	)
	.await?;

	Ok(bridge::bridge(stream, upstream, &ctx.shutdown).await)
}
