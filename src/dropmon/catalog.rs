// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The drop-point catalog: static taxonomy mapping drop-site names to
//! reason codes.

use std::collections::HashMap;

use crate::error::CatalogLoadError;
use super::reason::{resolve_reason, ReasonCode};

/// One catalog source row, as it appears in the compile-time tables:
/// `(op, symbol, reason_name)`.
#[derive(Debug, Clone, Copy)]
pub struct SourceEntry {
    pub op: &'static str,
    pub symbol: &'static str,
    pub reason_name: &'static str,
}

/// A resolved drop-point entry.
#[derive(Debug, Clone)]
pub struct DropPoint {
    pub symbol: String,
    pub is_pattern: bool,
    pub reason: ReasonCode,
}

/// fnmatch-style glob: `*` matches any run (including empty), `?` matches
/// exactly one character, comparison is case-insensitive.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let candidate: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();
    glob_match_inner(&pattern, &candidate)
}

fn glob_match_inner(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.first() {
        None => candidate.is_empty(),
        Some('*') => {
            glob_match_inner(&pattern[1..], candidate)
                || (!candidate.is_empty() && glob_match_inner(pattern, &candidate[1..]))
        }
        Some('?') => !candidate.is_empty() && glob_match_inner(&pattern[1..], &candidate[1..]),
        Some(c) => {
            !candidate.is_empty() && candidate[0] == *c && glob_match_inner(&pattern[1..], &candidate[1..])
        }
    }
}

/// One namespace (software or hardware) of the drop-point catalog: an
/// exact-match map plus an ordered pattern list, with amortized
/// materialization of pattern hits.
#[derive(Debug, Default)]
pub struct CatalogNamespace {
    exact: HashMap<String, ReasonCode>,
    patterns: Vec<(String, ReasonCode)>,
}

impl CatalogNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads source rows, logging and skipping any row with an unknown
    /// operator or unresolved reason name. Returns the errors for rows
    /// that were skipped, in source order.
    pub fn load(entries: &[SourceEntry]) -> (Self, Vec<CatalogLoadError>) {
        let mut ns = CatalogNamespace::new();
        let mut errors = Vec::new();
        for entry in entries {
            match ns.try_insert(entry) {
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(symbol = entry.symbol, error = %e, "skipping drop-point entry");
                    errors.push(e);
                }
            }
        }
        (ns, errors)
    }

    fn try_insert(&mut self, entry: &SourceEntry) -> Result<(), CatalogLoadError> {
        let reason = resolve_reason(entry.reason_name)
            .ok_or_else(|| CatalogLoadError::UnresolvedReason(entry.reason_name.to_string()))?;
        match entry.op {
            "==" => {
                self.exact.insert(entry.symbol.to_string(), reason);
                Ok(())
            }
            "*=" => {
                self.patterns.push((entry.symbol.to_string(), reason));
                Ok(())
            }
            other => Err(CatalogLoadError::UnknownOperator(other.to_string())),
        }
    }

    /// Exact hash lookup, then a linear pattern scan with materialization
    /// on first hit.
    pub fn lookup(&mut self, symbol: &str) -> Option<ReasonCode> {
        if let Some(reason) = self.exact.get(symbol) {
            return Some(*reason);
        }
        for (pattern, reason) in &self.patterns {
            if glob_match(pattern, symbol) {
                let reason = *reason;
                self.exact.insert(symbol.to_string(), reason);
                return Some(reason);
            }
        }
        None
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    pub fn contains_exact(&self, symbol: &str) -> bool {
        self.exact.contains_key(symbol)
    }
}

/// Software and hardware catalogs plus the policy gates that decide
/// whether each is consulted at all.
pub struct DropPointCatalog {
    sw: CatalogNamespace,
    hw: CatalogNamespace,
    sw_enabled: bool,
    hw_enabled: bool,
    sw_ignored: u64,
    hw_ignored: u64,
}

impl DropPointCatalog {
    pub fn load(
        sw_entries: &[SourceEntry],
        hw_entries: &[SourceEntry],
        sw_enabled: bool,
        hw_enabled: bool,
    ) -> (Self, Vec<CatalogLoadError>) {
        let (sw, mut errors) = CatalogNamespace::load(sw_entries);
        let (hw, hw_errors) = CatalogNamespace::load(hw_entries);
        errors.extend(hw_errors);
        (
            DropPointCatalog {
                sw,
                hw,
                sw_enabled,
                hw_enabled,
                sw_ignored: 0,
                hw_ignored: 0,
            },
            errors,
        )
    }

    pub fn sw_ignored(&self) -> u64 {
        self.sw_ignored
    }

    pub fn hw_ignored(&self) -> u64 {
        self.hw_ignored
    }

    /// Software lookup, gated by `dropmon.sw`.
    pub fn lookup_sw(&mut self, symbol: &str) -> Option<ReasonCode> {
        if !self.sw_enabled {
            self.sw_ignored += 1;
            return None;
        }
        self.sw.lookup(symbol)
    }

    /// Hardware lookup, gated by `dropmon.hw`: tries an exact match on
    /// `name` first, then an exact match on `group`, then falls back to
    /// the name's pattern scan.
    pub fn lookup_hw(&mut self, group: Option<&str>, name: &str) -> Option<ReasonCode> {
        if !self.hw_enabled {
            self.hw_ignored += 1;
            return None;
        }
        if let Some(reason) = self.hw.exact.get(name).copied() {
            return Some(reason);
        }
        if let Some(group) = group {
            if let Some(reason) = self.hw.exact.get(group).copied() {
                return Some(reason);
            }
        }
        self.hw.lookup(name)
    }

    pub fn sw_exact_len(&self) -> usize {
        self.sw.exact_len()
    }

    pub fn sw_contains_exact(&self, symbol: &str) -> bool {
        self.sw.contains_exact(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn entry(op: &'static str, symbol: &'static str, reason: &'static str) -> SourceEntry {
        SourceEntry {
            op,
            symbol,
            reason_name: reason,
        }
    }

    #[test]
    fn glob_matches_single_and_multi_wildcards_case_insensitively() {
        assert!(glob_match("tcp_v?_rcv*", "TCP_V4_RCV_BAD"));
        assert!(glob_match("tcp_v?_rcv*", "tcp_v6_rcv"));
        assert!(!glob_match("tcp_v?_rcv*", "tcp_v44_rcv"));
        assert!(!glob_match("tcp_v?_rcv*", "udp_v4_rcv"));
    }

    #[test]
    fn exact_lookup_hits_before_pattern_scan() {
        let entries = [
            entry("==", "kfree_skb_reason", "unknown"),
            entry("*=", "kfree*", "netfilter_drop"),
        ];
        let (mut ns, errors) = CatalogNamespace::load(&entries);
        assert!(errors.is_empty());
        assert_eq!(ns.lookup("kfree_skb_reason"), Some(ReasonCode::Known(0)));
    }

    #[test]
    fn pattern_hit_is_materialized_into_exact_map() {
        let entries = [entry("*=", "tcp_v?_rcv*", "tcp_invalid_seq")];
        let (mut ns, _) = CatalogNamespace::load(&entries);
        assert!(!ns.contains_exact("tcp_v4_rcv_bad"));
        let first = ns.lookup("tcp_v4_rcv_bad");
        assert_eq!(first, Some(ReasonCode::Known(1)));
        assert!(ns.contains_exact("tcp_v4_rcv_bad"));
        let second = ns.lookup("tcp_v4_rcv_bad");
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_operator_is_skipped_not_fatal() {
        let entries = [
            entry("~=", "whatever", "unknown"),
            entry("==", "real_symbol", "unknown"),
        ];
        let (ns, errors) = CatalogNamespace::load(&entries);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            CatalogLoadError::UnknownOperator("~=".to_string())
        );
        assert!(ns.contains_exact("real_symbol"));
    }

    #[test]
    fn unresolved_reason_is_skipped_not_fatal() {
        let entries = [entry("==", "real_symbol", "not_a_reason")];
        let (ns, errors) = CatalogNamespace::load(&entries);
        assert_eq!(errors.len(), 1);
        assert!(!ns.contains_exact("real_symbol"));
    }

    #[test]
    fn empty_reason_loads_as_none_sentinel() {
        let entries = [entry("==", "ignored_symbol", "")];
        let (mut ns, errors) = CatalogNamespace::load(&entries);
        assert!(errors.is_empty());
        assert_eq!(ns.lookup("ignored_symbol"), Some(ReasonCode::None));
    }

    #[test]
    fn disabled_namespace_increments_ignored_counter_without_lookup() {
        let (mut catalog, _) = DropPointCatalog::load(
            &[entry("==", "sym", "unknown")],
            &[],
            false,
            true,
        );
        assert_eq!(catalog.lookup_sw("sym"), None);
        assert_eq!(catalog.sw_ignored(), 1);
    }

    #[test]
    fn hw_lookup_tries_name_exact_before_group_exact() {
        let hw_entries = [
            entry("==", "mlxsw", "unknown"),
            entry("==", "trap_ingress", "acl_deny"),
        ];
        let (mut catalog, _) = DropPointCatalog::load(&[], &hw_entries, true, true);
        assert_eq!(
            catalog.lookup_hw(Some("mlxsw"), "trap_ingress"),
            Some(ReasonCode::Known(13))
        );
    }

    #[test]
    fn hw_lookup_tries_group_before_name_patterns() {
        let hw_entries = [
            entry("==", "mlxsw", "unknown"),
            entry("*=", "trap_*", "acl_deny"),
        ];
        let (mut catalog, _) = DropPointCatalog::load(&[], &hw_entries, true, true);
        assert_eq!(
            catalog.lookup_hw(Some("mlxsw"), "trap_ingress"),
            Some(ReasonCode::Known(0))
        );
        assert_eq!(
            catalog.lookup_hw(Some("unknown_group"), "trap_ingress"),
            Some(ReasonCode::Known(13))
        );
    }
}
