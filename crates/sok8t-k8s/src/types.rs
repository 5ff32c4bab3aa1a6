// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub use k8s_openapi::api::core::v1::{
	Container, ContainerPort, LocalObjectReference, Namespace, Pod, PodSpec, PodStatus,
};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
