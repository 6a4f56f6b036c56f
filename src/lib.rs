// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! Kernel Drop-Monitor and inet-diag TCP-info engines.
//!
//! Two cooperating, tick-driven protocol engines:
//! - [`dropmon`]: decodes the kernel's `NET_DM` multicast drop feed into
//!   sFlow discard events, via a 7-state handshake (family discovery,
//!   group join, configure, start) plus a rate controller and a one-shot
//!   circuit breaker.
//! - [`tcpinfo`]: issues `inet_diag` queries for sampled local TCP/UDP
//!   flows and annotates the pending sample(s) with the kernel's
//!   connection-level metrics once a reply correlates.
//!
//! Both engines are driven entirely by explicit calls from a caller-owned
//! event loop (`on_tick`/`on_deci`/`on_recv`/`on_flow_sample`/`on_final`);
//! neither spawns a thread or blocks.

#![cfg_attr(
    not(test),
    deny(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod config;
pub mod dropmon;
pub mod error;
pub mod netlink;
pub mod pending_sample;
pub mod ratelimit;
pub mod sflow;
pub mod tcpinfo;

pub use config::Config;
pub use error::{CatalogLoadError, NetlinkError};
