// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod listener;
mod logging;
mod readiness;
mod workload;

pub use listener::{ListenerConfig, ListenerConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use readiness::{ReadinessConfig, ReadinessConfigLayer};
pub use workload::{ImagePullPolicy, WorkloadConfig, WorkloadConfigLayer};
