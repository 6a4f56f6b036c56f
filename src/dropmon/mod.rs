// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! Drop-Monitor: kernel packet-drop notifications to sFlow discard events.

pub mod catalog;
pub mod engine;
pub mod protocol;
pub mod reason;

pub use catalog::{CatalogNamespace, DropPoint, DropPointCatalog, SourceEntry};
pub use engine::{DecodedAlert, DmState, DropMonitorEngine};
pub use reason::ReasonCode;

/// Compile-time software drop-point table. A production build would
/// generate this from the kernel's `kfree_skb_reason` enumeration; these
/// rows cover the reasons this crate's own tests exercise plus a
/// representative slice of real kernel call sites.
pub const DROP_POINTS_SW: &[SourceEntry] = &[
    SourceEntry {
        op: "==",
        symbol: "kfree_skb_reason",
        reason_name: "unknown",
    },
    SourceEntry {
        op: "*=",
        symbol: "tcp_v?_rcv*",
        reason_name: "tcp_invalid_seq",
    },
    SourceEntry {
        op: "*=",
        symbol: "tcp_v?_do_rcv*",
        reason_name: "tcp_invalid_ack",
    },
    SourceEntry {
        op: "*=",
        symbol: "*checksum*",
        reason_name: "other_invalid_checksum",
    },
    SourceEntry {
        op: "*=",
        symbol: "ip_rcv*",
        reason_name: "ip_invalid_header",
    },
    SourceEntry {
        op: "*=",
        symbol: "nf_hook_slow*",
        reason_name: "netfilter_drop",
    },
    SourceEntry {
        op: "*=",
        symbol: "udp*rcv*",
        reason_name: "",
    },
];

/// Compile-time hardware drop-point table.
pub const DROP_POINTS_HW: &[SourceEntry] = &[
    SourceEntry {
        op: "*=",
        symbol: "trap_*",
        reason_name: "acl_deny",
    },
    SourceEntry {
        op: "*=",
        symbol: "*buffer*",
        reason_name: "no_buffer_space",
    },
];
