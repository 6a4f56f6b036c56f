// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors surfaced at the netlink socket boundary.
///
/// Callers are expected to branch on these: a [`NetlinkError::WouldBlock`]
/// is routine (non-blocking socket, nothing pending) while the others feed
/// an engine's own failure bookkeeping (retry countdown, error counters).
#[derive(Debug, Error)]
pub enum NetlinkError {
    #[error("netlink socket operation would block")]
    WouldBlock,
    #[error("netlink send failed: {0}")]
    SendFailed(#[source] std::io::Error),
    #[error("netlink recv failed: {0}")]
    RecvFailed(#[source] std::io::Error),
    #[error("malformed attribute TLV at offset {offset}")]
    MalformedAttribute { offset: usize },
    #[error("failed to join multicast group {group}: {source}")]
    JoinGroupFailed { group: u32, source: std::io::Error },
    #[error("failed to set socket option: {0}")]
    SetSockOpt(#[source] std::io::Error),
}

impl NetlinkError {
    /// True if the underlying `io::Error` is `EAGAIN`/`EWOULDBLOCK`.
    pub fn is_would_block(err: &std::io::Error) -> bool {
        err.kind() == std::io::ErrorKind::WouldBlock
    }
}

/// Errors from loading the drop-point catalog. Every variant is non-fatal:
/// the loader logs and skips the offending entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogLoadError {
    #[error("unknown operator {0:?} (expected \"==\" or \"*=\")")]
    UnknownOperator(String),
    #[error("unresolved reason name {0:?}")]
    UnresolvedReason(String),
}
