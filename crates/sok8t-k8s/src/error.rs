// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Pod not found: {name}")]
	PodNotFound { name: String },

	#[error("Pod already exists: {name}")]
	PodAlreadyExists { name: String },

	#[error("Namespace not found: {name}")]
	NamespaceNotFound { name: String },

	#[error("K8s client configuration error: {message}")]
	ConfigError { message: String },
}

impl K8sError {
	/// Whether the error means the addressed object does not exist.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			K8sError::PodNotFound { .. } | K8sError::NamespaceNotFound { .. }
		)
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
