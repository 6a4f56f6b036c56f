// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The dual-indexed correlation table: hash map keyed by masked `sockid`
//! plus a FIFO timeout queue.

use std::collections::{HashMap, VecDeque};

use crate::pending_sample::FlowSample;

use super::protocol::InetDiagSockId;

/// One outstanding inet-diag query.
#[derive(Debug)]
pub struct TcpSampleRequest {
    pub sockid: InetDiagSockId,
    pub udp: bool,
    /// True if the sample's captured direction was "received", meaning
    /// the local/remote roles had to be swapped to build `sockid`.
    pub flipped: bool,
    pub seq: u32,
    pub enqueue_tick: u64,
    pub samples: Vec<FlowSample>,
}

/// Hash map + FIFO queue over [`TcpSampleRequest`], enforcing "membership
/// in map iff membership in queue" at every mutation site.
#[derive(Default)]
pub struct CorrelationTable {
    by_key: HashMap<[u8; 36], TcpSampleRequest>,
    queue: VecDeque<[u8; 36]>,
}

/// Outcome of attempting to enqueue a sample against the table.
pub enum EnqueueOutcome {
    /// Coalesced into an existing in-flight request; no new query needed.
    Coalesced,
    /// A new request was inserted; the caller must send an inet-diag
    /// query tagged with `seq`.
    Inserted { seq: u32 },
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.by_key.len(), self.queue.len());
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up by key first (request coalescing); on miss, calls
    /// `next_seq` to obtain a fresh sequence number and inserts a new
    /// request.
    pub fn enqueue(
        &mut self,
        sockid: InetDiagSockId,
        udp: bool,
        flipped: bool,
        sample: FlowSample,
        now_tick: u64,
        next_seq: impl FnOnce() -> u32,
    ) -> EnqueueOutcome {
        let key = sockid.mask_key();
        if let Some(existing) = self.by_key.get_mut(&key) {
            existing.samples.push(sample);
            return EnqueueOutcome::Coalesced;
        }
        let seq = next_seq();
        let request = TcpSampleRequest {
            sockid,
            udp,
            flipped,
            seq,
            enqueue_tick: now_tick,
            samples: vec![sample],
        };
        self.by_key.insert(key, request);
        self.queue.push_back(key);
        EnqueueOutcome::Inserted { seq }
    }

    /// Removes and returns the request matching `reply_sockid`'s masked
    /// key, unlinking it from both the map and the queue.
    pub fn remove_matching(&mut self, reply_sockid: &InetDiagSockId) -> Option<TcpSampleRequest> {
        let key = reply_sockid.mask_key();
        let request = self.by_key.remove(&key)?;
        self.unlink_queue_entry(&key);
        Some(request)
    }

    /// Removes every request whose `enqueue_tick` is older than
    /// `now_tick - max_age_ticks`, stopping at the first non-expired
    /// entry -- FIFO insertion order guarantees monotonically increasing
    /// age, so a non-expired head means nothing behind it can be expired
    /// either.
    pub fn sweep_timeouts(&mut self, now_tick: u64, max_age_ticks: u64) -> Vec<TcpSampleRequest> {
        let mut expired = Vec::new();
        while let Some(&key) = self.queue.front() {
            let age_ok = match self.by_key.get(&key) {
                Some(req) => now_tick.saturating_sub(req.enqueue_tick) <= max_age_ticks,
                None => false,
            };
            if age_ok {
                break;
            }
            self.queue.pop_front();
            if let Some(req) = self.by_key.remove(&key) {
                expired.push(req);
            }
        }
        expired
    }

    fn unlink_queue_entry(&mut self, key: &[u8; 36]) {
        if let Some(pos) = self.queue.iter().position(|k| k == key) {
            self.queue.remove(pos);
        }
    }
}
