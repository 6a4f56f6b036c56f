// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! Token-quota rate limiter and circuit breaker for drop events.
//!
//! Unlike the timestamp-based `TokenBucketRateLimiter` used elsewhere in
//! this tree, the quota here is refreshed explicitly by the caller's own
//! tick/deci cadence rather than computed from elapsed wall-clock time --
//! this engine has no clock of its own, only scheduler callbacks.

/// Per-event-loop-tick (1Hz) and per-decisecond (10Hz) quota refill,
/// mirroring the original split: a `limit` under 10/sec is refilled once a
/// second (any finer division would round to zero), otherwise it's spread
/// across deciseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateController {
    limit: u32,
    quota: i64,
    /// Events suppressed since the last successfully emitted event, exposed
    /// as `drops` on the *next* successfully emitted event.
    no_quota: u32,
}

impl RateController {
    pub fn new(limit: u32) -> Self {
        RateController {
            limit,
            quota: limit as i64,
            no_quota: 0,
        }
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// True when refill should happen on the 1Hz tick rather than the 10Hz
    /// decisecond callback.
    fn refills_on_tick(&self) -> bool {
        self.limit < 10
    }

    /// Called once per second. Refills the quota when `limit < 10`.
    pub fn on_tick(&mut self) {
        if self.refills_on_tick() {
            self.quota = self.limit as i64;
        }
    }

    /// Called ten times per second. Refills a tenth of the quota when
    /// `limit >= 10`.
    pub fn on_deci(&mut self) {
        if !self.refills_on_tick() {
            self.quota = (self.limit / 10) as i64;
        }
    }

    /// Consumes one token if available. Returns the `drops` count to stamp
    /// on the event being emitted right now -- the suppressed count
    /// accumulated since the previous successful emission -- and resets it.
    pub fn try_consume(&mut self) -> Option<u32> {
        if self.quota <= 0 {
            self.no_quota = self.no_quota.saturating_add(1);
            return None;
        }
        self.quota -= 1;
        let drops = self.no_quota;
        self.no_quota = 0;
        Some(drops)
    }

    pub fn no_quota(&self) -> u32 {
        self.no_quota
    }
}

/// Per-tick circuit breaker: trips permanently (one-shot, never resets)
/// once more than `max` total drops are observed within one 1Hz tick.
/// `max == 0` disables the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreaker {
    max: u32,
    total_this_tick: u32,
    tripped: bool,
}

impl CircuitBreaker {
    pub fn new(max: u32) -> Self {
        CircuitBreaker {
            max,
            total_this_tick: 0,
            tripped: false,
        }
    }

    pub fn set_max(&mut self, max: u32) {
        self.max = max;
    }

    pub fn record(&mut self, count: u32) {
        if self.tripped {
            return;
        }
        self.total_this_tick = self.total_this_tick.saturating_add(count);
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Called once per second, after drops for the elapsed tick have all
    /// been recorded. Returns `true` the instant the breaker trips.
    pub fn on_tick(&mut self) -> bool {
        let tripping_now = !self.tripped && self.max != 0 && self.total_this_tick > self.max;
        if tripping_now {
            self.tripped = true;
        }
        self.total_this_tick = 0;
        tripping_now
    }
}
