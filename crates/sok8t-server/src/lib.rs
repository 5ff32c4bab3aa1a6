// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection-triggered ephemeral workload bridge.
//!
//! Every accepted TCP connection gets a dedicated pod, created on demand,
//! bridged byte-for-byte once it is reachable and deleted when either side
//! closes.

pub mod bridge;
pub mod error;
pub mod naming;
pub mod provisioner;
pub mod readiness;
pub mod reaper;
pub mod server;
pub mod session;

pub use bridge::{bridge, BridgeStats, BUFFER_SIZE};
pub use error::{ServerError, SessionError};
pub use naming::workload_name;
pub use readiness::{Dialer, TcpDialer};
pub use reaper::{reap, sweep, ReapOutcome, SweepResult};
pub use server::{bind_dual_stack, Server};
pub use session::{Session, SessionContext, SessionOutcome};
