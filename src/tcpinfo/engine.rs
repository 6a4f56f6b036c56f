// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The TCP-Info Annotator request/response engine.

use crate::config::TcpConfig;
use crate::error::NetlinkError;
use crate::netlink::message::{NlMsg, NLM_F_REQUEST};
use crate::netlink::socket::{recv_batch, NetlinkFamily, NetlinkSocket};
use crate::pending_sample::{FlowSample, IpProtocol};
use crate::sflow::{PacketDirection, TcpInfoElement};

use super::protocol::{
    parse_inet_diag_msg, sockid, InetDiagReqV2, InetDiagSockId, RawTcpInfo,
    AF_INET, AF_INET6, INET_DIAG_ATTR_INFO, INET_DIAG_MSG_HDRLEN, INET_DIAG_NOCOOKIE,
    INET_DIAG_REQ_INFO_EXT, IPPROTO_TCP, IPPROTO_UDP, SOCK_DIAG_BY_FAMILY,
    TCPF_ESTABLISHED, UDP_ALL_STATES,
};
use super::request::{CorrelationTable, EnqueueOutcome, TcpSampleRequest};

/// 400ms request lifetime, expressed in deci ticks (100ms granularity).
const TIMEOUT_DECI_TICKS: u64 = 4;

#[derive(Debug, Default, Clone, Copy)]
pub struct TcpInfoMetrics {
    pub diag_tx: u64,
    pub diag_timeouts: u64,
    /// Cumulative lower-bound on lost netlink replies, from sequence-gap
    /// accounting on inbound diag replies.
    pub seq_loss: u64,
}

pub struct TcpInfoAnnotator {
    config: TcpConfig,
    sock: Option<NetlinkSocket>,
    table: CorrelationTable,
    last_rx_seq: Option<u32>,
    deci_ticks: u64,
    metrics: TcpInfoMetrics,
}

impl TcpInfoAnnotator {
    pub fn new(config: TcpConfig) -> Self {
        TcpInfoAnnotator {
            config,
            sock: None,
            table: CorrelationTable::new(),
            last_rx_seq: None,
            deci_ticks: 0,
            metrics: TcpInfoMetrics::default(),
        }
    }

    pub fn on_config_changed(&mut self, config: TcpConfig) {
        self.config = config;
    }

    pub fn metrics(&self) -> TcpInfoMetrics {
        self.metrics
    }

    pub fn pending_len(&self) -> usize {
        self.table.len()
    }

    fn ensure_socket(&mut self) -> Result<(), NetlinkError> {
        if self.sock.is_none() {
            self.sock = Some(NetlinkSocket::open(NetlinkFamily::SockDiag)?);
        }
        Ok(())
    }

    /// `flow_sample` ingress event.
    pub fn on_flow_sample(&mut self, sample: FlowSample) -> Result<(), NetlinkError> {
        if !sample.is_locally_terminated() {
            return Ok(());
        }
        let (Some(local), Some(remote)) = (sample.local_endpoint(), sample.remote_endpoint())
        else {
            unreachable!("is_locally_terminated guarantees exactly one local side")
        };

        // idiag_src is always the local side; flag when the captured
        // direction required a swap.
        let flipped = !sample.local_src;
        let mut id = sockid(local.addr, local.port, remote.addr, remote.port);
        id.idiag_if = sample.sampler_ifindex;
        id.idiag_cookie = [INET_DIAG_NOCOOKIE, INET_DIAG_NOCOOKIE];

        let udp = matches!(sample.protocol, IpProtocol::Udp);

        self.ensure_socket()?;
        let deci_ticks = self.deci_ticks;
        let Some(sock) = self.sock.as_ref() else {
            unreachable!("ensure_socket populates self.sock")
        };
        let outcome = self
            .table
            .enqueue(id, udp, flipped, sample, deci_ticks, || sock.next_seq());

        if let EnqueueOutcome::Inserted { seq } = outcome {
            let req = build_diag_request(&id, udp, seq);
            let Some(sock) = self.sock.as_ref() else {
                unreachable!("ensure_socket populates self.sock")
            };
            sock.send_raw(&req)?;
            self.metrics.diag_tx += 1;
        }
        Ok(())
    }

    /// Drains the socket, matching replies back to pending requests and
    /// annotating every sample each carries.
    pub fn on_recv(&mut self, sink_for: impl Fn(&mut FlowSample, TcpInfoElement)) -> Result<usize, NetlinkError> {
        let Some(sock) = self.sock.take() else {
            return Ok(0);
        };
        let mut replies: Vec<(InetDiagSockId, u32, Vec<u8>)> = Vec::new();
        let handled = recv_batch(&sock, |msg: NlMsg<'_>| {
            if msg.header.msg_type != SOCK_DIAG_BY_FAMILY {
                return;
            }
            if let Some(diag_msg) = parse_inet_diag_msg(msg.payload) {
                let rest = &msg.payload[INET_DIAG_MSG_HDRLEN..];
                if let Some(info_bytes) = find_info_attr(rest) {
                    replies.push((diag_msg.id, msg.header.seq, info_bytes.to_vec()));
                }
            }
        });
        self.sock = Some(sock);
        let handled = handled?;

        for (reply_sockid, seq, info_bytes) in replies {
            if let Some(request) = self.table.remove_matching(&reply_sockid) {
                if let Some(last) = self.last_rx_seq {
                    let gap = seq.wrapping_sub(last).wrapping_sub(1);
                    self.metrics.seq_loss = self.metrics.seq_loss.saturating_add(gap as u64);
                }
                self.last_rx_seq = Some(seq);

                let raw = RawTcpInfo::from_kernel_payload(&info_bytes);
                annotate_request(request, &raw, &sink_for);
            }
        }
        Ok(handled)
    }

    /// `deci` (10Hz) ingress event: sweeps requests past their 400ms
    /// lifetime.
    pub fn on_deci(&mut self) {
        self.deci_ticks += 1;
        let expired = self.table.sweep_timeouts(self.deci_ticks, TIMEOUT_DECI_TICKS);
        self.metrics.diag_timeouts += expired.len() as u64;
        // Held samples are simply dropped here, released un-annotated.
    }

    /// `final` shutdown event: closes the socket; any requests still in
    /// the table release their samples un-annotated.
    pub fn on_final(&mut self) {
        self.sock = None;
    }
}

fn build_diag_request(id: &InetDiagSockId, udp: bool, seq: u32) -> Vec<u8> {
    let family = if is_v6(&id.idiag_src) { AF_INET6 } else { AF_INET };
    let req = InetDiagReqV2 {
        sdiag_family: family,
        sdiag_protocol: if udp { IPPROTO_UDP } else { IPPROTO_TCP },
        idiag_ext: INET_DIAG_REQ_INFO_EXT as u8,
        pad: 0,
        idiag_states: if udp { UDP_ALL_STATES } else { TCPF_ESTABLISHED },
        id: *id,
    };
    let body = req.to_bytes();
    let total_len = 16 + body.len();
    let mut buf = Vec::with_capacity(total_len);
    buf.extend_from_slice(&(total_len as u32).to_ne_bytes());
    buf.extend_from_slice(&SOCK_DIAG_BY_FAMILY.to_ne_bytes());
    buf.extend_from_slice(&NLM_F_REQUEST.to_ne_bytes());
    buf.extend_from_slice(&seq.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());
    buf.extend_from_slice(&body);
    buf
}

fn is_v6(addr: &[u8; 16]) -> bool {
    addr[4..16].iter().any(|&b| b != 0)
}

fn find_info_attr(rest: &[u8]) -> Option<&[u8]> {
    use crate::netlink::message::AttributeIter;
    AttributeIter::new(rest)
        .find(|attr| attr.attr_type == INET_DIAG_ATTR_INFO)
        .map(|attr| attr.data)
}

fn annotate_request(
    request: TcpSampleRequest,
    raw: &RawTcpInfo,
    sink_for: &impl Fn(&mut FlowSample, TcpInfoElement),
) {
    let mut samples = request.samples;
    for mut sample in samples.drain(..) {
        let dirn = if sample.local_src {
            PacketDirection::Sent
        } else {
            PacketDirection::Received
        };
        let element = TcpInfoElement {
            dirn: Some(dirn),
            snd_mss: raw.tcpi_snd_mss,
            rcv_mss: raw.tcpi_rcv_mss,
            unacked: raw.tcpi_unacked,
            lost: raw.tcpi_lost,
            retrans: raw.tcpi_total_retrans,
            pmtu: raw.tcpi_pmtu,
            rtt: raw.tcpi_rtt,
            rttvar: raw.tcpi_rttvar,
            snd_cwnd: raw.tcpi_snd_cwnd,
            reordering: raw.tcpi_reordering,
            min_rtt: raw.tcpi_min_rtt,
        };
        sink_for(&mut sample, element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending_sample::Endpoint;
    use std::cell::RefCell;
    use std::net::{IpAddr, Ipv4Addr};

    fn local_sample() -> FlowSample {
        FlowSample {
            protocol: IpProtocol::Tcp,
            src: Endpoint {
                addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                port: 5000,
            },
            dst: Endpoint {
                addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)),
                port: 80,
            },
            local_src: true,
            local_dst: false,
            sampler_ifindex: 3,
        }
    }

    #[test]
    fn annotate_request_sets_sent_direction_for_local_src_samples() {
        let request = TcpSampleRequest {
            sockid: sockid(
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                5000,
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)),
                80,
            ),
            udp: false,
            flipped: false,
            seq: 1,
            enqueue_tick: 0,
            samples: vec![local_sample()],
        };
        let mut raw = RawTcpInfo::default();
        raw.tcpi_rtt = 12345;
        raw.tcpi_min_rtt = 4000;
        raw.tcpi_snd_cwnd = 10;

        let captured: RefCell<Vec<TcpInfoElement>> = RefCell::new(Vec::new());
        annotate_request(request, &raw, &|_sample, element| {
            captured.borrow_mut().push(element);
        });

        let elements = captured.borrow();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].dirn, Some(PacketDirection::Sent));
        assert_eq!(elements[0].rtt, 12345);
        assert_eq!(elements[0].min_rtt, 4000);
        assert_eq!(elements[0].snd_cwnd, 10);
    }

    #[test]
    fn non_locally_terminated_sample_is_ignored() {
        let mut annotator = TcpInfoAnnotator::new(TcpConfig::default());
        let mut sample = local_sample();
        sample.local_dst = true; // both sides local now
        let result = annotator.on_flow_sample(sample);
        assert!(result.is_ok());
        assert_eq!(annotator.pending_len(), 0);
    }

    #[test]
    fn find_info_attr_locates_the_info_rta() {
        use crate::netlink::message::encode_attr;
        let mut buf = Vec::new();
        buf.extend(encode_attr(1, &[0u8; 4]));
        buf.extend(encode_attr(INET_DIAG_ATTR_INFO, &[0xAA; 8]));
        let found = find_info_attr(&buf).unwrap();
        assert_eq!(found, &[0xAA; 8]);
    }
}
