// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::{
	api::{Api, DeleteParams, ListParams, PostParams},
	Client,
};
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;

/// Production K8s client implementation using the kube crate.
#[derive(Clone)]
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. KUBECONFIG environment variable
	/// 2. ~/.kube/config
	/// 3. In-cluster service account (when running in K8s)
	pub async fn new() -> Result<Self, K8sError> {
		let client = Client::try_default()
			.await
			.map_err(|e| K8sError::ConfigError {
				message: e.to_string(),
			})?;
		debug!("K8s client initialized");
		Ok(Self { client })
	}

	fn pods(&self, namespace: &str) -> Api<Pod> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

#[async_trait]
impl K8sClient for KubeClient {
	#[instrument(skip(self, pod), fields(pod_name = ?pod.metadata.name))]
	async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, K8sError> {
		let name = pod.metadata.name.clone().unwrap_or_default();
		match self.pods(namespace).create(&PostParams::default(), &pod).await {
			Ok(pod) => Ok(pod),
			Err(kube::Error::Api(err)) if err.code == 409 => {
				Err(K8sError::PodAlreadyExists { name })
			}
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::NamespaceNotFound {
				name: namespace.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn delete_pod(
		&self,
		name: &str,
		namespace: &str,
		grace_period_seconds: u32,
	) -> Result<(), K8sError> {
		let dp = DeleteParams {
			grace_period_seconds: Some(grace_period_seconds),
			..Default::default()
		};
		match self.pods(namespace).delete(name, &dp).await {
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::PodNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		let lp = ListParams::default().labels(label_selector);
		let pod_list = self.pods(namespace).list(&lp).await?;
		Ok(pod_list.items)
	}

	#[instrument(skip(self), level = "trace")]
	async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod, K8sError> {
		match self.pods(namespace).get(name).await {
			Ok(pod) => Ok(pod),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::PodNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		match namespaces.get(name).await {
			Ok(ns) => Ok(ns),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::NamespaceNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}
}
