// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! TCP-Info Annotator: inet-diag request/response correlation and kernel
//! TCP metric enrichment.

pub mod engine;
pub mod protocol;
pub mod request;

pub use engine::{TcpInfoAnnotator, TcpInfoMetrics};
pub use protocol::RawTcpInfo;
pub use request::{CorrelationTable, TcpSampleRequest};
