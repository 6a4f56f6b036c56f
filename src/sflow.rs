// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The sFlow-agent contract this crate writes into.
//!
//! The real encoder/agent lives outside this crate -- redesigning the sFlow
//! wire format is out of scope here. These types are the minimal shape this
//! crate needs in order to build and hand off a discard event or a TCP-info
//! annotation; a production host binds them to its own sFlow library.

use std::collections::HashMap;

/// Direction of a sampled packet relative to this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDirection {
    Sent,
    Received,
}

/// `SFLHeader_protocol` values this crate sets; only Ethernet is produced
/// directly, the rest pass through whatever the sample pipeline decoded.
pub const HEADER_PROTOCOL_ETHERNET_ISO8023: u32 = 1;

/// `SFLFlow_sample_element` header payload (`EX_... / FLOW_HEADER` element).
#[derive(Debug, Clone, Default)]
pub struct HeaderElement {
    pub header_protocol: u32,
    pub frame_length: u32,
    pub stripped: u32,
    pub header_length: u32,
    pub header_bytes: Vec<u8>,
}

/// `EX_FUNCTION` element: symbolic kernel drop-site name (software drops
/// only).
#[derive(Debug, Clone)]
pub struct FunctionElement {
    pub symbol: String,
}

/// `EX_TCP_INFO` element: the subset of kernel `tcp_info` fields this
/// crate forwards, plus the sample's direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpInfoElement {
    pub dirn: Option<PacketDirection>,
    pub snd_mss: u32,
    pub rcv_mss: u32,
    pub unacked: u32,
    pub lost: u32,
    pub retrans: u32,
    pub pmtu: u32,
    pub rtt: u32,
    pub rttvar: u32,
    pub snd_cwnd: u32,
    pub reordering: u32,
    pub min_rtt: u32,
}

/// An sFlow discard event.
#[derive(Debug, Clone)]
pub struct DiscardEvent {
    pub reason: u32,
    pub input_ifindex: u32,
    /// Count of events suppressed by the rate limiter since the last
    /// successfully emitted event.
    pub drops: u32,
    pub header: HeaderElement,
    pub function: Option<FunctionElement>,
}

/// Per-ingress-interface sink, as cached by a [`NotifierCache`].
pub trait Notifier {
    fn max_header_size(&self) -> u32;
    fn write_event_sample(&self, event: &DiscardEvent);
}

/// A sample this crate can attach an `EX_TCP_INFO` element to. Exposed as a
/// trait so an engine can be driven in tests without the real sample
/// pipeline.
pub trait SampleSink {
    fn add_tcp_info(&mut self, element: TcpInfoElement);
}

/// Process-wide sFlow agent: adds/caches per-ifindex notifiers and performs
/// the mutex-guarded write needed because the shared sFlow agent is
/// reachable from multiple engines concurrently.
pub trait SflowAgent<N: Notifier> {
    fn add_notifier(&self, ifindex: u32) -> N;
}

/// Lazily-created, cached-by-ifindex notifier map: a notifier is created on
/// first use and cached thereafter. Generic over the concrete
/// notifier/agent types an embedder provides.
pub struct NotifierCache<N> {
    notifiers: HashMap<u32, N>,
}

impl<N> Default for NotifierCache<N> {
    fn default() -> Self {
        NotifierCache {
            notifiers: HashMap::new(),
        }
    }
}

impl<N: Clone + Notifier> NotifierCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached notifier for `ifindex`, creating it via `agent` on
    /// first use.
    pub fn get_or_create<A: SflowAgent<N>>(&mut self, agent: &A, ifindex: u32) -> N {
        if let Some(existing) = self.notifiers.get(&ifindex) {
            return existing.clone();
        }
        let created = agent.add_notifier(ifindex);
        self.notifiers.insert(ifindex, created.clone());
        created
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct TestNotifier {
        ifindex: u32,
        events: Rc<RefCell<Vec<DiscardEvent>>>,
    }

    impl Notifier for TestNotifier {
        fn max_header_size(&self) -> u32 {
            128
        }
        fn write_event_sample(&self, event: &DiscardEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    struct TestAgent {
        created: RefCell<u32>,
    }

    impl SflowAgent<TestNotifier> for TestAgent {
        fn add_notifier(&self, ifindex: u32) -> TestNotifier {
            *self.created.borrow_mut() += 1;
            TestNotifier {
                ifindex,
                events: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    #[test]
    fn notifier_cache_creates_once_per_ifindex() {
        let agent = TestAgent {
            created: RefCell::new(0),
        };
        let mut cache: NotifierCache<TestNotifier> = NotifierCache::new();
        let n1 = cache.get_or_create(&agent, 7);
        let n2 = cache.get_or_create(&agent, 7);
        let n3 = cache.get_or_create(&agent, 8);
        assert_eq!(n1.ifindex, 7);
        assert_eq!(n2.ifindex, 7);
        assert_eq!(n3.ifindex, 8);
        assert_eq!(*agent.created.borrow(), 2);
        assert_eq!(cache.len(), 2);
    }
}
