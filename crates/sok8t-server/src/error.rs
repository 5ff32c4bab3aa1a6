// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::net::SocketAddr;
use std::time::Duration;

use sok8t_k8s::K8sError;
use thiserror::Error;

/// Errors that end a single client session before or during bridging.
#[derive(Error, Debug)]
pub enum SessionError {
	#[error("failed to provision workload {name}: {source}")]
	Provision {
		name: String,
		#[source]
		source: K8sError,
	},

	#[error("failed to read status of workload {name}: {source}")]
	Status {
		name: String,
		#[source]
		source: K8sError,
	},

	#[error("workload {name} terminated before becoming ready (phase: {phase})")]
	WorkloadTerminated { name: String, phase: String },

	#[error("workload {name} reported an unparseable address: {address}")]
	InvalidAddress { name: String, address: String },

	#[error("workload {name} was not assigned an address within {timeout:?}")]
	AddressTimeout { name: String, timeout: Duration },

	#[error("workload {name} did not accept connections on {addr} within {timeout:?}")]
	ConnectTimeout {
		name: String,
		addr: SocketAddr,
		timeout: Duration,
	},

	#[error("session cancelled by shutdown")]
	Cancelled,
}

impl SessionError {
	pub fn is_cancelled(&self) -> bool {
		matches!(self, SessionError::Cancelled)
	}
}

/// Errors that prevent the server from starting.
#[derive(Error, Debug)]
pub enum ServerError {
	#[error("failed to bind listener on port {port}: {source}")]
	Bind {
		port: u16,
		#[source]
		source: std::io::Error,
	},
}
