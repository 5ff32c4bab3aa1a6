// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures for sok8t-server integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sok8t_config::{
	ListenerConfig, LoggingConfig, ReadinessConfig, ServerConfig, WorkloadConfig,
};
use sok8t_k8s::{K8sClient, K8sError, Namespace, ObjectMeta, Pod, PodStatus};
use sok8t_server::provisioner::{MANAGED_LABEL, MANAGED_LABEL_VALUE};
use sok8t_server::{Dialer, SessionContext};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const NAMESPACE: &str = "bridges";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Create(String),
	Get(String),
	List(String),
	Delete(String),
}

/// In-memory cluster that records every call made against it.
///
/// `list_pods` ignores the label selector so callers must filter themselves.
#[derive(Default)]
pub struct MockK8sClient {
	pods: Mutex<HashMap<String, Pod>>,
	calls: Mutex<Vec<Call>>,
	polls: Mutex<HashMap<String, usize>>,
	address: Option<String>,
	address_after_polls: usize,
	phase: Option<String>,
	fail_create: bool,
	fail_list: bool,
	fail_delete: HashSet<String>,
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Report `address` once a pod has been read more than `after_polls` times.
	pub fn with_address(mut self, address: &str, after_polls: usize) -> Self {
		self.address = Some(address.to_string());
		self.address_after_polls = after_polls;
		self
	}

	pub fn with_phase(mut self, phase: &str) -> Self {
		self.phase = Some(phase.to_string());
		self
	}

	pub fn failing_create(mut self) -> Self {
		self.fail_create = true;
		self
	}

	pub fn failing_list(mut self) -> Self {
		self.fail_list = true;
		self
	}

	pub fn failing_delete(mut self, name: &str) -> Self {
		self.fail_delete.insert(name.to_string());
		self
	}

	pub fn with_pod(self, pod: Pod) -> Self {
		let name = pod.metadata.name.clone().unwrap_or_default();
		self.pods.lock().unwrap().insert(name, pod);
		self
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub fn creates(&self) -> Vec<String> {
		self
			.calls()
			.into_iter()
			.filter_map(|c| match c {
				Call::Create(name) => Some(name),
				_ => None,
			})
			.collect()
	}

	pub fn deletes(&self) -> Vec<String> {
		self
			.calls()
			.into_iter()
			.filter_map(|c| match c {
				Call::Delete(name) => Some(name),
				_ => None,
			})
			.collect()
	}

	pub fn gets(&self) -> usize {
		self
			.calls()
			.iter()
			.filter(|c| matches!(c, Call::Get(_)))
			.count()
	}

	pub fn pod_names(&self) -> HashSet<String> {
		self.pods.lock().unwrap().keys().cloned().collect()
	}

	fn record(&self, call: Call) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl K8sClient for MockK8sClient {
	async fn create_pod(&self, _namespace: &str, mut pod: Pod) -> Result<Pod, K8sError> {
		let name = pod.metadata.name.clone().unwrap_or_default();
		self.record(Call::Create(name.clone()));
		if self.fail_create {
			return Err(K8sError::ApiError {
				message: "admission webhook denied the request".to_string(),
			});
		}

		let mut pods = self.pods.lock().unwrap();
		if pods.contains_key(&name) {
			return Err(K8sError::PodAlreadyExists { name });
		}
		pod.status = Some(PodStatus {
			phase: Some("Pending".to_string()),
			..Default::default()
		});
		pods.insert(name, pod.clone());
		Ok(pod)
	}

	async fn delete_pod(
		&self,
		name: &str,
		_namespace: &str,
		_grace_period_seconds: u32,
	) -> Result<(), K8sError> {
		self.record(Call::Delete(name.to_string()));
		if self.fail_delete.contains(name) {
			return Err(K8sError::ApiError {
				message: "etcd unavailable".to_string(),
			});
		}
		match self.pods.lock().unwrap().remove(name) {
			Some(_) => Ok(()),
			None => Err(K8sError::PodNotFound {
				name: name.to_string(),
			}),
		}
	}

	async fn list_pods(&self, _namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		self.record(Call::List(label_selector.to_string()));
		if self.fail_list {
			return Err(K8sError::ApiError {
				message: "forbidden".to_string(),
			});
		}
		Ok(self.pods.lock().unwrap().values().cloned().collect())
	}

	async fn get_pod(&self, name: &str, _namespace: &str) -> Result<Pod, K8sError> {
		self.record(Call::Get(name.to_string()));
		let polls = {
			let mut polls = self.polls.lock().unwrap();
			let count = polls.entry(name.to_string()).or_insert(0);
			*count += 1;
			*count
		};

		let mut pod = self
			.pods
			.lock()
			.unwrap()
			.get(name)
			.cloned()
			.ok_or_else(|| K8sError::PodNotFound {
				name: name.to_string(),
			})?;

		let status = pod.status.get_or_insert_with(PodStatus::default);
		if let Some(phase) = &self.phase {
			status.phase = Some(phase.clone());
		}
		if polls > self.address_after_polls {
			if let Some(address) = &self.address {
				status.pod_ip = Some(address.clone());
				status.phase = Some("Running".to_string());
			}
		}
		Ok(pod)
	}

	async fn get_namespace(&self, _name: &str) -> Result<Namespace, K8sError> {
		Ok(Namespace::default())
	}
}

/// Dialer that refuses a fixed number of attempts, then connects to `target`
/// whatever address was asked for.
pub struct ScriptedDialer {
	target: SocketAddr,
	refusals: AtomicUsize,
	attempts: Mutex<Vec<SocketAddr>>,
}

impl ScriptedDialer {
	pub fn new(target: SocketAddr, refusals: usize) -> Self {
		Self {
			target,
			refusals: AtomicUsize::new(refusals),
			attempts: Mutex::new(Vec::new()),
		}
	}

	pub fn attempts(&self) -> Vec<SocketAddr> {
		self.attempts.lock().unwrap().clone()
	}
}

#[async_trait]
impl Dialer for ScriptedDialer {
	async fn dial(&self, addr: SocketAddr) -> io::Result<TcpStream> {
		self.attempts.lock().unwrap().push(addr);
		let refuse = self
			.refusals
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
			.is_ok();
		if refuse {
			return Err(io::Error::new(
				io::ErrorKind::ConnectionRefused,
				"connection refused",
			));
		}
		TcpStream::connect(self.target).await
	}
}

pub fn test_config(target_port: u16) -> ServerConfig {
	ServerConfig {
		listener: ListenerConfig {
			port: 8000,
			drain_timeout: Duration::from_secs(5),
		},
		workload: WorkloadConfig {
			namespace: NAMESPACE.to_string(),
			image: "registry.example/pong:1".to_string(),
			target_port,
			image_pull_secret: None,
			image_pull_policy: None,
			delete_grace_period_secs: 5,
		},
		readiness: ReadinessConfig {
			address_poll_interval: Duration::from_millis(10),
			connect_poll_interval: Duration::from_millis(10),
			address_timeout: Some(Duration::from_secs(10)),
			connect_timeout: Some(Duration::from_secs(10)),
		},
		logging: LoggingConfig {
			level: "debug".to_string(),
			json: false,
		},
	}
}

pub fn context(
	client: Arc<MockK8sClient>,
	dialer: Arc<ScriptedDialer>,
	config: ServerConfig,
) -> SessionContext {
	SessionContext::new(client, Arc::new(config), CancellationToken::new()).with_dialer(dialer)
}

pub fn pod_named(name: &str, managed: bool) -> Pod {
	let mut labels = BTreeMap::new();
	if managed {
		labels.insert(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string());
	} else {
		labels.insert("app".to_string(), "unrelated".to_string());
	}
	Pod {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			namespace: Some(NAMESPACE.to_string()),
			labels: Some(labels),
			..Default::default()
		},
		..Default::default()
	}
}

/// A connected TCP pair: the client's end and the server's accepted end.
pub async fn client_pair() -> (TcpStream, TcpStream, SocketAddr) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let client = TcpStream::connect(listener.local_addr().unwrap())
		.await
		.unwrap();
	let (accepted, peer) = listener.accept().await.unwrap();
	(client, accepted, peer)
}

/// A workload that answers every `ping` with `pong` and returns what it read.
pub async fn spawn_pong_workload() -> (SocketAddr, JoinHandle<Vec<u8>>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let handle = tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();
		let mut received = Vec::new();
		let mut buf = [0u8; 4];
		loop {
			match stream.read_exact(&mut buf).await {
				Ok(_) => {
					received.extend_from_slice(&buf);
					if &buf == b"ping" {
						stream.write_all(b"pong").await.unwrap();
					}
				}
				Err(_) => break,
			}
		}
		received
	});
	(addr, handle)
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while !condition() {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("condition not reached in time");
}
