// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The flow-sample contract this crate reads from.
//!
//! A `flow_sample` event hands the TCP-Info Annotator a decoded packet
//! header plus enough addressing context to mount an `inet_diag` lookup.
//! The real sampling pipeline (pcap/eBPF capture, header parse) lives
//! outside this crate; [`FlowSample`] is the minimal shape it hands over.

use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Tcp,
    Udp,
}

/// One endpoint of a sampled 4-tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: IpAddr,
    pub port: u16,
}

/// A decoded packet header handed to the annotator, with enough context
/// to decide locality and build an `inet_diag` request.
#[derive(Debug, Clone, Copy)]
pub struct FlowSample {
    pub protocol: IpProtocol,
    pub src: Endpoint,
    pub dst: Endpoint,
    /// True if `src` is an address owned by this host.
    pub local_src: bool,
    /// True if `dst` is an address owned by this host.
    pub local_dst: bool,
    /// Sampler's ingress ifindex, used as `idiag_if` and cross-checked
    /// against the sampling datasource.
    pub sampler_ifindex: u32,
}

impl FlowSample {
    /// A sample is eligible for TCP-info annotation only when exactly one
    /// endpoint is local.
    pub fn is_locally_terminated(&self) -> bool {
        self.local_src != self.local_dst
    }

    /// The host-local endpoint, when exactly one side is local.
    pub fn local_endpoint(&self) -> Option<Endpoint> {
        if self.is_locally_terminated() {
            Some(if self.local_src { self.src } else { self.dst })
        } else {
            None
        }
    }

    /// The remote endpoint, when exactly one side is local.
    pub fn remote_endpoint(&self) -> Option<Endpoint> {
        if self.is_locally_terminated() {
            Some(if self.local_src { self.dst } else { self.src })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn sample(local_src: bool, local_dst: bool) -> FlowSample {
        FlowSample {
            protocol: IpProtocol::Tcp,
            src: Endpoint {
                addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                port: 5000,
            },
            dst: Endpoint {
                addr: IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
                port: 443,
            },
            local_src,
            local_dst,
            sampler_ifindex: 2,
        }
    }

    #[test]
    fn exactly_one_local_is_eligible() {
        assert!(sample(true, false).is_locally_terminated());
        assert!(sample(false, true).is_locally_terminated());
        assert!(!sample(true, true).is_locally_terminated());
        assert!(!sample(false, false).is_locally_terminated());
    }

    #[test]
    fn local_and_remote_endpoints_follow_the_local_side() {
        let s = sample(true, false);
        assert_eq!(s.local_endpoint(), Some(s.src));
        assert_eq!(s.remote_endpoint(), Some(s.dst));

        let s = sample(false, true);
        assert_eq!(s.local_endpoint(), Some(s.dst));
        assert_eq!(s.remote_endpoint(), Some(s.src));
    }

    #[test]
    fn neither_or_both_local_yields_no_endpoints() {
        assert_eq!(sample(true, true).local_endpoint(), None);
        assert_eq!(sample(false, false).remote_endpoint(), None);
    }
}
