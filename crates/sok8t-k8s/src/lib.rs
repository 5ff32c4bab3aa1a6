// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for sok8t workload provisioning.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - Re-exports of the pod types the provisioner builds

mod client;
mod error;
mod kube_client;
mod types;

pub use client::K8sClient;
pub use error::K8sError;
pub use kube_client::KubeClient;
pub use types::{
	Container, ContainerPort, LocalObjectReference, Namespace, ObjectMeta, Pod, PodSpec, PodStatus,
};
