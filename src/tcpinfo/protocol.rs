// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! `NETLINK_SOCK_DIAG` / `inet_diag` wire structures.

use std::mem::size_of;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub const AF_INET: u8 = 2;
pub const AF_INET6: u8 = 10;

pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

pub const SOCK_DIAG_BY_FAMILY: u16 = 20;

pub const TCPF_ESTABLISHED: u32 = 1 << 1;
/// UDP has no connection state machine the way TCP does, so the kernel's
/// dump-all-states convention is used here rather than a narrower mask.
pub const UDP_ALL_STATES: u32 = 0xFFFF;

pub const INET_DIAG_NONE: u16 = 0;
pub const INET_DIAG_INFO: u16 = 2;

/// `(1 << (INET_DIAG_INFO - 1))`, the extension request bitmask.
pub const INET_DIAG_REQ_INFO_EXT: u32 = 1 << (INET_DIAG_INFO - 1);

pub const INET_DIAG_NOCOOKIE: u32 = 0xFFFF_FFFF;

/// 16 bytes: big enough for an IPv6 address, left-padded with zero for
/// IPv4 (matches `inet_diag_sockid.idiag_src`/`idiag_dst`).
pub type InetDiagAddr = [u8; 16];

/// Mirrors `struct inet_diag_sockid`. The hash-table comparison key masks
/// this down to 36 bytes -- everything except `idiag_if` and the opaque
/// `idiag_cookie`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct InetDiagSockId {
    pub idiag_sport: u16,
    pub idiag_dport: u16,
    pub idiag_src: InetDiagAddr,
    pub idiag_dst: InetDiagAddr,
    pub idiag_if: u32,
    pub idiag_cookie: [u32; 2],
}

impl InetDiagSockId {
    /// The 36-byte masked comparison key used by the correlation table
    /// (everything up to but excluding `idiag_if`).
    pub fn mask_key(&self) -> [u8; 36] {
        let mut key = [0u8; 36];
        key[0..2].copy_from_slice(&self.idiag_sport.to_ne_bytes());
        key[2..4].copy_from_slice(&self.idiag_dport.to_ne_bytes());
        key[4..20].copy_from_slice(&self.idiag_src);
        key[20..36].copy_from_slice(&self.idiag_dst);
        key
    }
}

fn addr_to_bytes(addr: IpAddr) -> InetDiagAddr {
    let mut out = [0u8; 16];
    match addr {
        IpAddr::V4(v4) => out[0..4].copy_from_slice(&v4.octets()),
        IpAddr::V6(v6) => out.copy_from_slice(&v6.octets()),
    }
    out
}

pub fn addr_from_bytes(family: u8, bytes: &InetDiagAddr) -> IpAddr {
    if family == AF_INET6 {
        IpAddr::V6(Ipv6Addr::from(*bytes))
    } else {
        let mut v4 = [0u8; 4];
        v4.copy_from_slice(&bytes[0..4]);
        IpAddr::V4(Ipv4Addr::from(v4))
    }
}

pub fn sockid(local_addr: IpAddr, local_port: u16, remote_addr: IpAddr, remote_port: u16) -> InetDiagSockId {
    InetDiagSockId {
        idiag_sport: local_port,
        idiag_dport: remote_port,
        idiag_src: addr_to_bytes(local_addr),
        idiag_dst: addr_to_bytes(remote_addr),
        idiag_if: 0,
        idiag_cookie: [0, 0],
    }
}

/// Mirrors `struct inet_diag_req_v2`, the request payload sent after the
/// `nlmsghdr`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct InetDiagReqV2 {
    pub sdiag_family: u8,
    pub sdiag_protocol: u8,
    pub idiag_ext: u8,
    pub pad: u8,
    pub idiag_states: u32,
    pub id: InetDiagSockId,
}

impl InetDiagReqV2 {
    pub fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(size_of::<Self>());
        out.push(self.sdiag_family);
        out.push(self.sdiag_protocol);
        out.push(self.idiag_ext);
        out.push(self.pad);
        out.extend_from_slice(&self.idiag_states.to_ne_bytes());
        out.extend_from_slice(&self.id.idiag_sport.to_ne_bytes());
        out.extend_from_slice(&self.id.idiag_dport.to_ne_bytes());
        out.extend_from_slice(&self.id.idiag_src);
        out.extend_from_slice(&self.id.idiag_dst);
        out.extend_from_slice(&self.id.idiag_if.to_ne_bytes());
        out.extend_from_slice(&self.id.idiag_cookie[0].to_ne_bytes());
        out.extend_from_slice(&self.id.idiag_cookie[1].to_ne_bytes());
        out
    }
}

/// Mirrors the fixed prefix of `struct inet_diag_msg`, the reply payload.
#[derive(Debug, Clone, Copy)]
pub struct InetDiagMsg {
    pub idiag_family: u8,
    pub idiag_state: u8,
    pub id: InetDiagSockId,
}

/// `idiag_family/state/timer/retrans` (4) + `id` (48) +
/// `idiag_expires/rqueue/wqueue/uid/inode` (5 x 4 = 20) = 72.
pub const INET_DIAG_MSG_HDRLEN: usize = 4 + 48 + 4 + 4 + 4 + 4 + 4;

pub fn parse_inet_diag_msg(buf: &[u8]) -> Option<InetDiagMsg> {
    if buf.len() < INET_DIAG_MSG_HDRLEN {
        return None;
    }
    let idiag_family = buf[0];
    let idiag_state = buf[1];
    let idiag_sport = u16::from_ne_bytes(buf[4..6].try_into().ok()?);
    let idiag_dport = u16::from_ne_bytes(buf[6..8].try_into().ok()?);
    let mut idiag_src = [0u8; 16];
    idiag_src.copy_from_slice(&buf[8..24]);
    let mut idiag_dst = [0u8; 16];
    idiag_dst.copy_from_slice(&buf[24..40]);
    let idiag_if = u32::from_ne_bytes(buf[40..44].try_into().ok()?);
    let idiag_cookie = [
        u32::from_ne_bytes(buf[44..48].try_into().ok()?),
        u32::from_ne_bytes(buf[48..52].try_into().ok()?),
    ];
    Some(InetDiagMsg {
        idiag_family,
        idiag_state,
        id: InetDiagSockId {
            idiag_sport,
            idiag_dport,
            idiag_src,
            idiag_dst,
            idiag_if,
            idiag_cookie,
        },
    })
}

/// `INET_DIAG_INFO` RTA type, within the attribute stream following
/// [`INET_DIAG_MSG_HDRLEN`] bytes.
pub const INET_DIAG_ATTR_INFO: u16 = INET_DIAG_INFO;

/// Local copy of the kernel's `struct tcp_info`, laid out field-for-field
/// to match its stable prefix. Only a stable prefix is consumed downstream;
/// trailing fields from newer kernels are retained here but unused.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct RawTcpInfo {
    pub tcpi_state: u8,
    pub tcpi_ca_state: u8,
    pub tcpi_retransmits: u8,
    pub tcpi_probes: u8,
    pub tcpi_backoff: u8,
    pub tcpi_options: u8,
    pub tcpi_wscale: u8, // tcpi_snd_wscale:4, tcpi_rcv_wscale:4
    _pad0: u8, // compiler alignment padding before the tcpi_rto u32 block

    pub tcpi_rto: u32,
    pub tcpi_ato: u32,
    pub tcpi_snd_mss: u32,
    pub tcpi_rcv_mss: u32,

    pub tcpi_unacked: u32,
    pub tcpi_sacked: u32,
    pub tcpi_lost: u32,
    pub tcpi_retrans: u32,
    pub tcpi_fackets: u32,

    pub tcpi_last_data_sent: u32,
    pub tcpi_last_ack_sent: u32,
    pub tcpi_last_data_recv: u32,
    pub tcpi_last_ack_recv: u32,

    pub tcpi_pmtu: u32,
    pub tcpi_rcv_ssthresh: u32,
    pub tcpi_rtt: u32,
    pub tcpi_rttvar: u32,
    pub tcpi_snd_ssthresh: u32,
    pub tcpi_snd_cwnd: u32,
    pub tcpi_advmss: u32,
    pub tcpi_reordering: u32,

    pub tcpi_rcv_rtt: u32,
    pub tcpi_rcv_space: u32,

    pub tcpi_total_retrans: u32,

    pub tcpi_pacing_rate: u64,
    pub tcpi_max_pacing_rate: u64,
    pub tcpi_bytes_acked: u64,
    pub tcpi_bytes_received: u64,
    pub tcpi_segs_out: u32,
    pub tcpi_segs_in: u32,

    pub tcpi_notsent_bytes: u32,
    pub tcpi_min_rtt: u32,
    pub tcpi_data_segs_in: u32,
    pub tcpi_data_segs_out: u32,

    pub tcpi_delivery_rate: u64,

    pub tcpi_busy_time: u64,
    pub tcpi_rwnd_limited: u64,
    pub tcpi_sndbuf_limited: u64,

    pub tcpi_delivered: u32,
    pub tcpi_delivered_ce: u32,

    pub tcpi_bytes_sent: u64,
    pub tcpi_bytes_retrans: u64,
    pub tcpi_dsack_dups: u32,
    pub tcpi_reord_seen: u32,

    pub tcpi_rcv_ooopack: u32,

    pub tcpi_snd_wnd: u32,
}

impl RawTcpInfo {
    pub const SIZE: usize = size_of::<RawTcpInfo>();

    /// Copies `kernel_payload` into a zero-initialized struct, up to
    /// `min(kernel_len, Self::SIZE)` bytes, so older/newer kernels with a
    /// shorter/longer `tcp_info` than this build still decode correctly.
    ///
    /// # Safety
    /// `RawTcpInfo` is `repr(C)` and made entirely of plain integer
    /// fields, so any byte pattern (including all zero) is a valid
    /// value; writing a truncated/zero-padded copy is sound.
    pub fn from_kernel_payload(kernel_payload: &[u8]) -> Self {
        let mut info = RawTcpInfo::default();
        let copy_len = kernel_payload.len().min(Self::SIZE);
        unsafe {
            let dst = &mut info as *mut RawTcpInfo as *mut u8;
            std::ptr::copy_nonoverlapping(kernel_payload.as_ptr(), dst, copy_len);
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sockid_mask_key_excludes_if_and_cookie() {
        let mut a = sockid(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            1234,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            80,
        );
        let mut b = a;
        a.idiag_if = 3;
        a.idiag_cookie = [1, 2];
        b.idiag_if = 99;
        b.idiag_cookie = [9, 9];
        assert_eq!(a.mask_key(), b.mask_key());
    }

    #[test]
    fn sockid_mask_key_differs_on_address_or_port() {
        let a = sockid(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            1234,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            80,
        );
        let b = sockid(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            1235,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            80,
        );
        assert_ne!(a.mask_key(), b.mask_key());
    }

    #[test]
    fn tcp_info_copy_law_zero_pads_short_kernel_payload() {
        // Only the first 8 bytes (up through tcpi_delivery_rate_app_limited)
        // provided; everything after must come back zeroed.
        let short_payload = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let info = RawTcpInfo::from_kernel_payload(&short_payload);
        assert_eq!(info.tcpi_state, 1);
        assert_eq!(info.tcpi_ca_state, 2);
        assert_eq!(info.tcpi_rto, 0);
        assert_eq!(info.tcpi_snd_wnd, 0);
    }

    #[test]
    fn tcp_info_copy_law_ignores_trailing_bytes_from_newer_kernel() {
        let oversized = vec![0xAAu8; RawTcpInfo::SIZE + 64];
        let info = RawTcpInfo::from_kernel_payload(&oversized);
        assert_eq!(info.tcpi_state, 0xAA);
        assert_eq!(info.tcpi_snd_wnd, u32::from_ne_bytes([0xAA; 4]));
    }

    #[test]
    fn parses_inet_diag_msg_header_fields() {
        let mut buf = vec![0u8; INET_DIAG_MSG_HDRLEN];
        buf[0] = AF_INET;
        buf[1] = 1;
        buf[4..6].copy_from_slice(&1234u16.to_ne_bytes());
        buf[6..8].copy_from_slice(&80u16.to_ne_bytes());
        buf[40..44].copy_from_slice(&7u32.to_ne_bytes());
        let msg = parse_inet_diag_msg(&buf).unwrap();
        assert_eq!(msg.idiag_family, AF_INET);
        assert_eq!(msg.id.idiag_sport, 1234);
        assert_eq!(msg.id.idiag_dport, 80);
        assert_eq!(msg.id.idiag_if, 7);
    }
}
