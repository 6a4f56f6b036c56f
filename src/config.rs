// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The configuration surface recognized by this crate.
//!
//! This crate owns none of the parsing: the process-wide config loader is an
//! external collaborator that builds a [`Config`] and hands it (or a clone
//! of it) to the engines on `config_first`/`config_changed`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropMonConfig {
    /// Enable the SW-drop catalog and processing.
    pub sw: bool,
    /// Enable the HW-drop catalog and processing.
    pub hw: bool,
    /// Own the feed lifecycle (issue START/STOP).
    pub start: bool,
    /// Non-zero enables DM initialization. Not a netlink group id to join
    /// directly -- the real group id is discovered via `CMD_GETFAMILY`; this
    /// flag only gates whether DM attaches at all.
    pub group: u32,
    /// Rate cap, events/sec.
    pub limit: u32,
    /// Circuit-breaker threshold, events/sec; 0 disables.
    pub max: u32,
}

impl Default for DropMonConfig {
    fn default() -> Self {
        DropMonConfig {
            sw: true,
            hw: true,
            start: true,
            group: 0,
            limit: 100,
            max: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TcpConfig {
    /// Present but currently inert: re-lookup using inner IPIP-tunnel
    /// addresses is not implemented.
    pub tunnel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    pub dropmon: DropMonConfig,
    pub tcp: TcpConfig,
}
