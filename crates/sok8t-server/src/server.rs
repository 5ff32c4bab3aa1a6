// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Listener and accept loop.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::error::ServerError;
use crate::session::{Session, SessionContext};

const LISTEN_BACKLOG: i32 = 1024;
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Accepts client connections and runs one session per connection.
pub struct Server {
	ctx: SessionContext,
	listener: TcpListener,
	tracker: TaskTracker,
}

impl Server {
	/// Bind the configured port on all interfaces, IPv6 and IPv4.
	pub fn bind(ctx: SessionContext) -> Result<Self, ServerError> {
		let port = ctx.config.listener.port;
		let listener = bind_dual_stack(port).map_err(|source| ServerError::Bind { port, source })?;
		Ok(Self::with_listener(ctx, listener))
	}

	pub fn with_listener(ctx: SessionContext, listener: TcpListener) -> Self {
		Self {
			ctx,
			listener,
			tracker: TaskTracker::new(),
		}
	}

	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	/// Accept connections until shutdown, then wait for in-flight sessions.
	///
	/// Sessions observe the same shutdown token, so they abort their wait or
	/// bridge and delete their workloads. Draining stops after the configured
	/// drain timeout.
	pub async fn run(self) {
		let shutdown = self.ctx.shutdown.clone();
		info!(addr = ?self.local_addr().ok(), "accepting connections");

		loop {
			let accepted = tokio::select! {
				biased;
				_ = shutdown.cancelled() => break,
				accepted = self.listener.accept() => accepted,
			};

			match accepted {
				Ok((stream, peer)) => self.spawn_session(stream, peer),
				Err(e) => {
					error!(error = %e, "failed to accept connection");
					tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
				}
			}
		}

		drop(self.listener);
		self.tracker.close();
		let in_flight = self.tracker.len();
		if in_flight > 0 {
			info!(in_flight, "waiting for sessions to finish");
		}

		let drain_timeout = self.ctx.config.listener.drain_timeout;
		if tokio::time::timeout(drain_timeout, self.tracker.wait())
			.await
			.is_err()
		{
			warn!(
				remaining = self.tracker.len(),
				?drain_timeout,
				"drain timeout elapsed with sessions still running"
			);
		}
		info!("server stopped");
	}

	fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
		let session = Session::new(self.ctx.clone(), stream, peer);
		let workload = session.workload().to_string();
		info!(workload = %workload, %peer, "client connected");

		self.tracker.spawn(async move {
			match AssertUnwindSafe(session.run()).catch_unwind().await {
				Ok(outcome) => outcome.log(),
				Err(_) => error!(workload = %workload, %peer, "session panicked"),
			}
		});
	}
}

/// Bind `[::]:port` with `IPV6_V6ONLY` cleared so IPv4 clients arrive as
/// IPv4-mapped peers, falling back to `0.0.0.0:port` when the host has no
/// IPv6 stack.
pub fn bind_dual_stack(port: u16) -> io::Result<TcpListener> {
	let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
	match bind_socket(Domain::IPV6, v6) {
		Ok(listener) => Ok(listener),
		Err(e) => {
			warn!(error = %e, "IPv6 listener unavailable, falling back to IPv4");
			let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
			bind_socket(Domain::IPV4, v4)
		}
	}
}

fn bind_socket(domain: Domain, addr: SocketAddr) -> io::Result<TcpListener> {
	let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
	if domain == Domain::IPV6 {
		socket.set_only_v6(false)?;
	}
	socket.set_reuse_address(true)?;
	socket.bind(&addr.into())?;
	socket.listen(LISTEN_BACKLOG)?;
	socket.set_nonblocking(true)?;
	TcpListener::from_std(socket.into())
}
