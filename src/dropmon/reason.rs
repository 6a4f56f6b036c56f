// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The closed sFlow discard-reason enumeration -- a small integer drawn
//! from a fixed set of named drop reasons -- plus the name-to-code lookup
//! table used while loading the drop-point catalog.

/// A resolved drop reason, or the sentinel meaning "recognized but
/// deliberately ignored".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    Known(u32),
    None,
}

/// `(name, code)` pairs resolvable by the catalog loader. Values are
/// process-stable identifiers, not meant to match any particular kernel
/// constant.
const REASON_TABLE: &[(&str, u32)] = &[
    ("unknown", 0),
    ("tcp_invalid_seq", 1),
    ("tcp_invalid_ack", 2),
    ("tcp_invalid_checksum", 3),
    ("udp_invalid_checksum", 4),
    ("icmp_invalid_checksum", 5),
    ("other_invalid_checksum", 6),
    ("ip_invalid_header", 7),
    ("ip_invalid_destination", 8),
    ("ip_invalid_source", 9),
    ("ip_ttl_exceeded", 10),
    ("no_route", 11),
    ("no_buffer_space", 12),
    ("acl_deny", 13),
    ("acl_permit", 14),
    ("vlan_deny", 15),
    ("ingress_spanning_tree", 16),
    ("egress_spanning_tree", 17),
    ("port_list_is_empty", 18),
    ("port_loopback_filter", 19),
    ("blackhole_route", 20),
    ("unicast_rpf_check_failed", 21),
    ("socket_rcvbuf_full", 22),
    ("netfilter_drop", 23),
];

/// Resolves a reason name from the catalog source tables to a
/// [`ReasonCode`]. An empty name resolves to [`ReasonCode::None`] (a
/// catalog entry that matches but is deliberately ignored). An unresolved
/// non-empty name returns `None` so the caller can reject the catalog
/// entry at load time.
pub fn resolve_reason(name: &str) -> Option<ReasonCode> {
    if name.is_empty() {
        return Some(ReasonCode::None);
    }
    REASON_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, code)| ReasonCode::Known(*code))
}
