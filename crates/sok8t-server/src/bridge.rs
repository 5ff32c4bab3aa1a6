// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bidirectional byte relay between a client and its workload.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Size of the per-direction transfer buffer.
pub const BUFFER_SIZE: usize = 4096;

/// Bytes relayed in each direction once a bridge has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
	pub client_to_workload: u64,
	pub workload_to_client: u64,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
	ClientToWorkload,
	WorkloadToClient,
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Direction::ClientToWorkload => write!(f, "client->workload"),
			Direction::WorkloadToClient => write!(f, "workload->client"),
		}
	}
}

/// Relay bytes in both directions until either side finishes.
///
/// End of stream or an error in one direction stops the other direction
/// too; both write halves are shut down before returning. Cancelling
/// `shutdown` stops the bridge the same way.
pub async fn bridge<C, W>(client: C, workload: W, shutdown: &CancellationToken) -> BridgeStats
where
	C: AsyncRead + AsyncWrite + Send + 'static,
	W: AsyncRead + AsyncWrite + Send + 'static,
{
	let stop = shutdown.child_token();
	let (client_read, client_write) = tokio::io::split(client);
	let (workload_read, workload_write) = tokio::io::split(workload);

	let upstream = tokio::spawn(pump(
		Direction::ClientToWorkload,
		client_read,
		workload_write,
		stop.clone(),
	));
	let downstream = tokio::spawn(pump(
		Direction::WorkloadToClient,
		workload_read,
		client_write,
		stop,
	));

	let (upstream, downstream) = tokio::join!(upstream, downstream);
	let stats = BridgeStats {
		client_to_workload: upstream.unwrap_or_else(|e| {
			warn!(error = %e, "client->workload relay task failed");
			0
		}),
		workload_to_client: downstream.unwrap_or_else(|e| {
			warn!(error = %e, "workload->client relay task failed");
			0
		}),
	};
	debug!(
		client_to_workload = stats.client_to_workload,
		workload_to_client = stats.workload_to_client,
		"bridge closed"
	);
	stats
}

async fn pump<R, W>(direction: Direction, mut src: R, mut dst: W, stop: CancellationToken) -> u64
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut buf = vec![0u8; BUFFER_SIZE];
	let mut total: u64 = 0;

	loop {
		let read = tokio::select! {
			_ = stop.cancelled() => break,
			read = src.read(&mut buf) => read,
		};
		let n = match read {
			Ok(0) => {
				debug!(%direction, "end of stream");
				break;
			}
			Ok(n) => n,
			Err(e) => {
				debug!(%direction, error = %e, "read failed");
				break;
			}
		};

		let written = tokio::select! {
			_ = stop.cancelled() => break,
			written = dst.write_all(&buf[..n]) => written,
		};
		if let Err(e) = written {
			debug!(%direction, error = %e, "write failed");
			break;
		}
		total += n as u64;
	}

	stop.cancel();
	if let Err(e) = dst.shutdown().await {
		debug!(%direction, error = %e, "shutdown of write half failed");
	}
	total
}
