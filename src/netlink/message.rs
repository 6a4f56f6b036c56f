// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! Netlink wire framing: `nlmsghdr` + family payload + TLV attribute
//! stream.

use crate::error::NetlinkError;

pub const NLMSG_ALIGNTO: usize = 4;
pub const NLMSG_HDRLEN: usize = 16;
pub const NLA_HDRLEN: usize = 4;

pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;

pub const NLM_F_REQUEST: u16 = 1;
pub const NLM_F_ACK: u16 = 4;
pub const NLM_F_DUMP: u16 = 0x300;

pub const NLA_F_NESTED: u16 = 1 << 15;

pub fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// A decoded netlink message header plus a view into its payload.
#[derive(Debug, Clone, Copy)]
pub struct NlMsgHeader {
    pub len: u32,
    pub msg_type: u16,
    pub flags: u16,
    pub seq: u32,
    pub pid: u32,
}

impl NlMsgHeader {
    fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < NLMSG_HDRLEN {
            return None;
        }
        Some(NlMsgHeader {
            len: u32::from_ne_bytes(buf[0..4].try_into().ok()?),
            msg_type: u16::from_ne_bytes(buf[4..6].try_into().ok()?),
            flags: u16::from_ne_bytes(buf[6..8].try_into().ok()?),
            seq: u32::from_ne_bytes(buf[8..12].try_into().ok()?),
            pid: u32::from_ne_bytes(buf[12..16].try_into().ok()?),
        })
    }

    pub fn to_bytes(self) -> [u8; NLMSG_HDRLEN] {
        let mut buf = [0u8; NLMSG_HDRLEN];
        buf[0..4].copy_from_slice(&self.len.to_ne_bytes());
        buf[4..6].copy_from_slice(&self.msg_type.to_ne_bytes());
        buf[6..8].copy_from_slice(&self.flags.to_ne_bytes());
        buf[8..12].copy_from_slice(&self.seq.to_ne_bytes());
        buf[12..16].copy_from_slice(&self.pid.to_ne_bytes());
        buf
    }
}

/// One decoded netlink message: header plus the raw payload bytes
/// (family header + attributes), still encoded.
#[derive(Debug, Clone, Copy)]
pub struct NlMsg<'a> {
    pub header: NlMsgHeader,
    pub payload: &'a [u8],
}

/// The `error` field of an `NLMSG_ERROR` payload: `0` is an ACK,
/// non-zero is a kernel-reported failure (negative errno).
pub fn parse_error_payload(payload: &[u8]) -> Option<i32> {
    if payload.len() < 4 {
        return None;
    }
    Some(i32::from_ne_bytes(payload[0..4].try_into().ok()?))
}

/// Iterates whole netlink messages out of one `recv()` buffer, honoring
/// `NLMSG_OK` semantics: stops (without error) on a short trailing
/// fragment, which can't happen on a well-behaved kernel socket but is
/// handled defensively.
pub struct NlMsgIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> NlMsgIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        NlMsgIter { buf, offset: 0 }
    }
}

impl<'a> Iterator for NlMsgIter<'a> {
    type Item = NlMsg<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = &self.buf[self.offset..];
        if remaining.len() < NLMSG_HDRLEN {
            return None;
        }
        let header = NlMsgHeader::parse(remaining)?;
        let msg_len = header.len as usize;
        if msg_len < NLMSG_HDRLEN || msg_len > remaining.len() {
            return None;
        }
        let payload = &remaining[NLMSG_HDRLEN..msg_len];
        self.offset += nlmsg_align(msg_len);
        Some(NlMsg { header, payload })
    }
}

/// One decoded `nlattr`: type (with the `NLA_F_NESTED` flag already
/// stripped into `nested`) plus its raw data.
#[derive(Debug, Clone, Copy)]
pub struct Attribute<'a> {
    pub attr_type: u16,
    pub nested: bool,
    pub data: &'a [u8],
}

/// Walks a TLV attribute stream starting at `buf`, matching
/// `UTNLA_OK`/`UTNLA_NEXT` in the original C: a zero-length or
/// overrunning attribute aborts iteration (the rest of the buffer is
/// abandoned) without panicking.
pub struct AttributeIter<'a> {
    buf: &'a [u8],
    offset: usize,
    malformed: bool,
}

impl<'a> AttributeIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        AttributeIter {
            buf,
            offset: 0,
            malformed: false,
        }
    }

    /// True once iteration has stopped early because of a malformed TLV.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.malformed {
            return None;
        }
        let remaining_len = self.buf.len().checked_sub(self.offset)?;
        if remaining_len < NLA_HDRLEN {
            return None;
        }
        let rest = &self.buf[self.offset..];
        let nla_len = u16::from_ne_bytes(rest[0..2].try_into().ok()?) as usize;
        let raw_type = u16::from_ne_bytes(rest[2..4].try_into().ok()?);

        if nla_len == 0 || nla_len < NLA_HDRLEN || nla_len > remaining_len {
            self.malformed = true;
            return None;
        }

        let data = &rest[NLA_HDRLEN..nla_len];
        let attr_type = raw_type & !NLA_F_NESTED;
        let nested = raw_type & NLA_F_NESTED != 0;
        self.offset += nlmsg_align(nla_len);
        Some(Attribute {
            attr_type,
            nested,
            data,
        })
    }
}

pub fn attr_u8(data: &[u8]) -> Option<u8> {
    data.first().copied()
}

pub fn attr_u16(data: &[u8]) -> Option<u16> {
    Some(u16::from_ne_bytes(data.get(0..2)?.try_into().ok()?))
}

pub fn attr_u32(data: &[u8]) -> Option<u32> {
    Some(u32::from_ne_bytes(data.get(0..4)?.try_into().ok()?))
}

pub fn attr_u64(data: &[u8]) -> Option<u64> {
    Some(u64::from_ne_bytes(data.get(0..8)?.try_into().ok()?))
}

/// A C-string attribute payload, trimmed at the first NUL (kernel strings
/// are NUL-terminated and often padded).
pub fn attr_cstr(data: &[u8]) -> Option<&str> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    std::str::from_utf8(&data[..end]).ok()
}

/// Encodes `attr_type` + `value` as a single TLV, padded to
/// `NLMSG_ALIGNTO`. Used by senders that build a request on the stack.
pub fn encode_attr(attr_type: u16, value: &[u8]) -> Vec<u8> {
    let nla_len = NLA_HDRLEN + value.len();
    let mut out = vec![0u8; nlmsg_align(nla_len)];
    out[0..2].copy_from_slice(&(nla_len as u16).to_ne_bytes());
    out[2..4].copy_from_slice(&attr_type.to_ne_bytes());
    out[NLA_HDRLEN..NLA_HDRLEN + value.len()].copy_from_slice(value);
    out
}

pub fn try_parse_error(payload: &[u8]) -> Result<i32, NetlinkError> {
    parse_error_payload(payload).ok_or(NetlinkError::MalformedAttribute { offset: 0 })
}
