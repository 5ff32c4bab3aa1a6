// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Waiting for a freshly created workload to become reachable.
//!
//! Readiness has two phases: the workload must first be assigned an address,
//! then its target port must accept a TCP connection. Both phases poll at a
//! fixed interval, honour an optional deadline and stop as soon as the
//! shutdown token fires.

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use sok8t_config::ReadinessConfig;
use sok8t_k8s::{K8sClient, Pod};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::SessionError;

/// Opens TCP connections to workloads.
#[async_trait]
pub trait Dialer: Send + Sync {
	async fn dial(&self, addr: SocketAddr) -> io::Result<TcpStream>;
}

/// Connects directly with [`TcpStream::connect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
	async fn dial(&self, addr: SocketAddr) -> io::Result<TcpStream> {
		TcpStream::connect(addr).await
	}
}

/// Poll the workload until it reports an address.
///
/// Fails early when the pod reaches `Failed` or `Succeeded` without an
/// address, since it will never get one.
#[instrument(skip(client, readiness, shutdown))]
pub async fn wait_for_address(
	client: &dyn K8sClient,
	name: &str,
	namespace: &str,
	readiness: &ReadinessConfig,
	shutdown: &CancellationToken,
) -> Result<IpAddr, SessionError> {
	let poll = poll_address(client, name, namespace, readiness.address_poll_interval);

	bounded(poll, readiness.address_timeout, shutdown, |timeout| {
		SessionError::AddressTimeout {
			name: name.to_string(),
			timeout,
		}
	})
	.await
}

async fn poll_address(
	client: &dyn K8sClient,
	name: &str,
	namespace: &str,
	interval: Duration,
) -> Result<IpAddr, SessionError> {
	let mut polls: u32 = 0;
	loop {
		polls += 1;
		let pod = client
			.get_pod(name, namespace)
			.await
			.map_err(|source| SessionError::Status {
				name: name.to_string(),
				source,
			})?;

		if let Some(address) = pod_ip(&pod) {
			let ip = address
				.parse::<IpAddr>()
				.map_err(|_| SessionError::InvalidAddress {
					name: name.to_string(),
					address: address.to_string(),
				})?;
			debug!(polls, %ip, "workload address assigned");
			return Ok(ip);
		}

		if let Some(phase) = terminal_phase(&pod) {
			return Err(SessionError::WorkloadTerminated {
				name: name.to_string(),
				phase: phase.to_string(),
			});
		}

		debug!(polls, "workload has no address yet");
		tokio::time::sleep(interval).await;
	}
}

/// Retry connecting to the workload until its port accepts.
///
/// Every connect error is treated as transient; only the deadline or
/// shutdown ends the wait.
#[instrument(skip(dialer, readiness, shutdown))]
pub async fn wait_for_connection(
	dialer: &dyn Dialer,
	name: &str,
	addr: SocketAddr,
	readiness: &ReadinessConfig,
	shutdown: &CancellationToken,
) -> Result<TcpStream, SessionError> {
	let interval = readiness.connect_poll_interval;
	let attempts =
		async move { Ok::<_, SessionError>(dial_until_connected(dialer, addr, interval).await) };

	bounded(attempts, readiness.connect_timeout, shutdown, |timeout| {
		SessionError::ConnectTimeout {
			name: name.to_string(),
			addr,
			timeout,
		}
	})
	.await
}

async fn dial_until_connected(
	dialer: &dyn Dialer,
	addr: SocketAddr,
	interval: Duration,
) -> TcpStream {
	let mut attempt: u32 = 0;
	loop {
		attempt += 1;
		match dialer.dial(addr).await {
			Ok(stream) => {
				info!(attempt, "connected to workload");
				return stream;
			}
			Err(e) => {
				debug!(attempt, error = %e, "workload not accepting connections yet");
				tokio::time::sleep(interval).await;
			}
		}
	}
}

/// Run a readiness phase under an optional deadline, aborting on shutdown.
async fn bounded<T, F>(
	phase: F,
	deadline: Option<Duration>,
	shutdown: &CancellationToken,
	on_timeout: impl FnOnce(Duration) -> SessionError,
) -> Result<T, SessionError>
where
	F: Future<Output = Result<T, SessionError>>,
{
	let limited = async move {
		match deadline {
			Some(limit) => match tokio::time::timeout(limit, phase).await {
				Ok(result) => result,
				Err(_) => Err(on_timeout(limit)),
			},
			None => phase.await,
		}
	};

	tokio::select! {
		biased;
		_ = shutdown.cancelled() => Err(SessionError::Cancelled),
		result = limited => result,
	}
}

fn pod_ip(pod: &Pod) -> Option<&str> {
	pod
		.status
		.as_ref()
		.and_then(|s| s.pod_ip.as_deref())
		.filter(|ip| !ip.is_empty())
}

fn terminal_phase(pod: &Pod) -> Option<&str> {
	pod
		.status
		.as_ref()
		.and_then(|s| s.phase.as_deref())
		.filter(|phase| matches!(*phase, "Failed" | "Succeeded"))
}
