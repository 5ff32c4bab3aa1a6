// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workload pod construction and creation.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use sok8t_config::WorkloadConfig;
use sok8t_k8s::{
	Container, ContainerPort, K8sClient, LocalObjectReference, ObjectMeta, Pod, PodSpec,
};
use tracing::{info, instrument};

use crate::error::SessionError;

pub const MANAGED_LABEL: &str = "sok8t.io/managed";
pub const MANAGED_LABEL_VALUE: &str = "true";
pub const REMOTE_ENDPOINT_ANNOTATION: &str = "sok8t.io/remote-endpoint";
pub const CONTAINER_NAME: &str = "workload";

/// Label selector matching every workload this process creates.
pub fn managed_selector() -> String {
	format!("{MANAGED_LABEL}={MANAGED_LABEL_VALUE}")
}

/// Whether a pod carries the managed marker.
pub fn is_managed(pod: &Pod) -> bool {
	pod
		.metadata
		.labels
		.as_ref()
		.and_then(|labels| labels.get(MANAGED_LABEL))
		.is_some_and(|value| value == MANAGED_LABEL_VALUE)
}

/// Build the pod definition for one client's workload.
///
/// Pod and container share the workload image; the container exposes the
/// target port and the pod never restarts, since a workload serves exactly
/// one connection.
pub fn build_pod_spec(name: &str, peer: &SocketAddr, config: &WorkloadConfig) -> Pod {
	let mut labels = BTreeMap::new();
	labels.insert(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string());

	let mut annotations = BTreeMap::new();
	annotations.insert(REMOTE_ENDPOINT_ANNOTATION.to_string(), peer.to_string());

	let container = Container {
		name: CONTAINER_NAME.to_string(),
		image: Some(config.image.clone()),
		image_pull_policy: config.image_pull_policy.map(|p| p.as_str().to_string()),
		ports: Some(vec![ContainerPort {
			container_port: i32::from(config.target_port),
			protocol: Some("TCP".to_string()),
			..Default::default()
		}]),
		..Default::default()
	};

	let image_pull_secrets = config.image_pull_secret.as_ref().map(|secret| {
		vec![LocalObjectReference {
			name: secret.clone(),
		}]
	});

	Pod {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			namespace: Some(config.namespace.clone()),
			labels: Some(labels),
			annotations: Some(annotations),
			..Default::default()
		},
		spec: Some(PodSpec {
			containers: vec![container],
			image_pull_secrets,
			restart_policy: Some("Never".to_string()),
			..Default::default()
		}),
		status: None,
	}
}

/// Create the workload pod for a client session.
#[instrument(skip(client, config), fields(namespace = %config.namespace))]
pub async fn provision(
	client: &dyn K8sClient,
	name: &str,
	peer: &SocketAddr,
	config: &WorkloadConfig,
) -> Result<Pod, SessionError> {
	let pod = build_pod_spec(name, peer, config);
	let created = client
		.create_pod(&config.namespace, pod)
		.await
		.map_err(|source| SessionError::Provision {
			name: name.to_string(),
			source,
		})?;

	info!(workload = %name, image = %config.image, "workload created");
	Ok(created)
}
