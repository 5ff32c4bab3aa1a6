// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deterministic workload names derived from client endpoints.

use std::net::{IpAddr, SocketAddr};

pub const NAME_PREFIX: &str = "sok8t-";
pub const NAME_SUFFIX: &str = "-pod";

/// Derive the workload name for a client endpoint.
///
/// The textual endpoint (`10.1.2.3:51234`, `[fd00::1]:51234`) has its
/// brackets removed and every other character outside `[a-z0-9-]` replaced
/// by `-`, so `10.1.2.3:51234` becomes `sok8t-10-1-2-3-51234-pod`.
/// IPv4-mapped IPv6 peers are named by their IPv4 form. A non-zero IPv6
/// scope id is kept as `-s<id>` so `[fe80::1%3]:443` cannot collide with
/// `[fe80::1:3]:443`.
pub fn workload_name(peer: &SocketAddr) -> String {
	let endpoint = match canonical_peer(peer) {
		SocketAddr::V4(v4) => sanitize_endpoint(&v4.to_string()),
		SocketAddr::V6(v6) => {
			let mut endpoint = sanitize_endpoint(&v6.ip().to_string());
			if v6.scope_id() != 0 {
				endpoint.push_str(&format!("-s{}", v6.scope_id()));
			}
			format!("{endpoint}-{}", v6.port())
		}
	};
	format!("{NAME_PREFIX}{endpoint}{NAME_SUFFIX}")
}

/// Collapse an IPv4-mapped IPv6 address (`[::ffff:a.b.c.d]:p`) to `a.b.c.d:p`.
pub fn canonical_peer(peer: &SocketAddr) -> SocketAddr {
	match peer {
		SocketAddr::V6(v6) => match v6.ip().to_ipv4_mapped() {
			Some(v4) => SocketAddr::new(IpAddr::V4(v4), v6.port()),
			None => *peer,
		},
		SocketAddr::V4(_) => *peer,
	}
}

fn sanitize_endpoint(endpoint: &str) -> String {
	endpoint
		.chars()
		.filter(|c| !matches!(c, '[' | ']'))
		.map(|c| {
			let c = c.to_ascii_lowercase();
			if c.is_ascii_lowercase() || c.is_ascii_digit() {
				c
			} else {
				'-'
			}
		})
		.collect()
}
