// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workload deletion: per-session cleanup and the startup sweep.

use sok8t_config::WorkloadConfig;
use sok8t_k8s::{K8sClient, K8sError};
use tracing::{debug, info, instrument, warn};

use crate::provisioner::{is_managed, managed_selector};

/// Result of a best-effort workload deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapOutcome {
	Deleted,
	/// Nothing to delete; the workload was never created or is already gone.
	NotFound,
	Failed(String),
}

/// Delete a workload, logging instead of failing.
#[instrument(skip(client))]
pub async fn reap(
	client: &dyn K8sClient,
	name: &str,
	namespace: &str,
	grace_period_secs: u32,
) -> ReapOutcome {
	match client.delete_pod(name, namespace, grace_period_secs).await {
		Ok(()) => {
			info!(workload = %name, "workload deleted");
			ReapOutcome::Deleted
		}
		Err(e) if e.is_not_found() => {
			debug!(workload = %name, "workload already gone");
			ReapOutcome::NotFound
		}
		Err(e) => {
			warn!(workload = %name, error = %e, "failed to delete workload");
			ReapOutcome::Failed(e.to_string())
		}
	}
}

/// Workloads touched by a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
	pub deleted: Vec<String>,
	pub failed: Vec<String>,
}

/// Delete every managed workload left in the namespace by a previous run.
///
/// Pods are filtered on the managed label again after listing, so a client
/// that ignores the selector still never deletes foreign pods. Individual
/// deletion failures are recorded and do not stop the sweep.
#[instrument(skip(client, config), fields(namespace = %config.namespace))]
pub async fn sweep(
	client: &dyn K8sClient,
	config: &WorkloadConfig,
) -> Result<SweepResult, K8sError> {
	let pods = client
		.list_pods(&config.namespace, &managed_selector())
		.await?;

	let mut result = SweepResult::default();
	for pod in pods.iter().filter(|pod| is_managed(pod)) {
		let Some(name) = pod.metadata.name.as_deref() else {
			continue;
		};
		match reap(
			client,
			name,
			&config.namespace,
			config.delete_grace_period_secs,
		)
		.await
		{
			ReapOutcome::Deleted => result.deleted.push(name.to_string()),
			ReapOutcome::NotFound => {}
			ReapOutcome::Failed(_) => result.failed.push(name.to_string()),
		}
	}

	info!(
		deleted = result.deleted.len(),
		failed = result.failed.len(),
		"sweep of leftover workloads completed"
	);
	Ok(result)
}
