// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! Generic-netlink and `inet_diag` wire plumbing shared by both engines.

pub mod message;
pub mod socket;

pub use message::{Attribute, AttributeIter, NlMsg, NlMsgHeader, NlMsgIter};
pub use socket::{recv_batch, NetlinkFamily, NetlinkSocket};
