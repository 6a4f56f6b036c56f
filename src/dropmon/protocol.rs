// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! `NET_DM` generic-netlink wire constants.

/// `genlmsghdr`: command + version, immediately after `nlmsghdr`.
pub const GENL_HDRLEN: usize = 4;

// Control family (family id 0x10, always-present "genl ctrl" family).
pub const GENL_ID_CTRL: u16 = 0x10;
pub const CTRL_CMD_GETFAMILY: u8 = 3;
pub const CTRL_ATTR_FAMILY_ID: u16 = 1;
pub const CTRL_ATTR_FAMILY_NAME: u16 = 2;
pub const CTRL_ATTR_VERSION: u16 = 3;
pub const CTRL_ATTR_HDRSIZE: u16 = 4;
pub const CTRL_ATTR_MAXATTR: u16 = 5;
pub const CTRL_ATTR_OPS: u16 = 6;
pub const CTRL_ATTR_MCAST_GROUPS: u16 = 7;
pub const CTRL_ATTR_MCAST_GRP_NAME: u16 = 1;
pub const CTRL_ATTR_MCAST_GRP_ID: u16 = 2;

pub const NET_DM_FAMILY_NAME: &str = "NET_DM";
pub const NET_DM_GRP_ALERT: &str = "events";

// NET_DM commands.
pub const NET_DM_CMD_UNSPEC: u8 = 0;
pub const NET_DM_CMD_ALERT: u8 = 1;
pub const NET_DM_CMD_CONFIG: u8 = 2;
pub const NET_DM_CMD_START: u8 = 3;
pub const NET_DM_CMD_STOP: u8 = 4;

// NET_DM attributes.
pub const NET_DM_ATTR_UNSPEC: u16 = 0;
pub const NET_DM_ATTR_ALERT_MODE: u16 = 1;
pub const NET_DM_ATTR_PC: u16 = 2;
pub const NET_DM_ATTR_SYMBOL: u16 = 3;
pub const NET_DM_ATTR_IN_PORT: u16 = 4;
pub const NET_DM_ATTR_TIMESTAMP: u16 = 5;
pub const NET_DM_ATTR_PROTO: u16 = 6;
pub const NET_DM_ATTR_PAYLOAD: u16 = 7;
pub const NET_DM_ATTR_PAD: u16 = 8;
pub const NET_DM_ATTR_TRUNC_LEN: u16 = 9;
pub const NET_DM_ATTR_ORIG_LEN: u16 = 10;
pub const NET_DM_ATTR_QUEUE_LEN: u16 = 11;
pub const NET_DM_ATTR_STATS: u16 = 12;
pub const NET_DM_ATTR_HW_STATS: u16 = 13;
pub const NET_DM_ATTR_ORIGIN: u16 = 14;
pub const NET_DM_ATTR_HW_TRAP_GROUP_NAME: u16 = 15;
pub const NET_DM_ATTR_HW_TRAP_NAME: u16 = 16;
pub const NET_DM_ATTR_HW_ENTRIES: u16 = 17;
pub const NET_DM_ATTR_HW_ENTRY: u16 = 18;
pub const NET_DM_ATTR_HW_TRAP_COUNT: u16 = 19;
pub const NET_DM_ATTR_SW_DROPS: u16 = 20;
pub const NET_DM_ATTR_HW_DROPS: u16 = 21;

// Nested PORT attribute.
pub const NET_DM_ATTR_PORT_NETDEV_IFINDEX: u16 = 1;

pub const NET_DM_ALERT_MODE_SUMMARY: u8 = 0;
pub const NET_DM_ALERT_MODE_PACKET: u8 = 1;

pub const NET_DM_ORIGIN_SOFTWARE: u16 = 0;
pub const NET_DM_ORIGIN_HARDWARE: u16 = 1;

/// Human-readable form of the `NET_DM_ATTR_ORIGIN` value, for log lines only
/// -- dispatch decisions use the raw `u16` against the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
#[repr(u16)]
pub enum DmOrigin {
    Software = 0,
    Hardware = 1,
}

impl DmOrigin {
    pub fn from_raw(origin: u16) -> Option<Self> {
        num_traits::FromPrimitive::from_u16(origin)
    }
}

/// Config knobs applied on `CMD_CONFIG`.
pub const DEFAULT_TRUNC_LEN: u32 = 128;
pub const DEFAULT_QUEUE_LEN: u32 = 100;

/// `PAYLOAD` attributes are captured with this many bytes already stripped
/// by the kernel before the sample reaches userspace.
pub const PAYLOAD_STRIPPED_BYTES: u32 = 4;

/// A decoded `CTRL_CMD_GETFAMILY` reply: the family's numeric id plus the
/// alert multicast group's id, if the `events` group was present.
#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyInfo {
    pub family_id: Option<u16>,
    pub alert_group_id: Option<u32>,
}

/// Walks a `CTRL_CMD_GETFAMILY` reply's attributes looking for the family id
/// and the `NET_DM_GRP_ALERT` multicast group id, nested under
/// `CTRL_ATTR_MCAST_GROUPS`.
pub fn parse_family_reply(payload: &[u8]) -> FamilyInfo {
    use crate::netlink::message::{attr_cstr, attr_u16, attr_u32, AttributeIter};

    let mut info = FamilyInfo::default();
    // Skip the genlmsghdr at the front of the payload.
    if payload.len() < GENL_HDRLEN {
        return info;
    }
    for attr in AttributeIter::new(&payload[GENL_HDRLEN..]) {
        match attr.attr_type {
            CTRL_ATTR_FAMILY_ID => info.family_id = attr_u16(attr.data),
            CTRL_ATTR_MCAST_GROUPS => {
                for group in AttributeIter::new(attr.data) {
                    let mut name: Option<&str> = None;
                    let mut id: Option<u32> = None;
                    for field in AttributeIter::new(group.data) {
                        match field.attr_type {
                            CTRL_ATTR_MCAST_GRP_NAME => name = attr_cstr(field.data),
                            CTRL_ATTR_MCAST_GRP_ID => id = attr_u32(field.data),
                            _ => {}
                        }
                    }
                    if name == Some(NET_DM_GRP_ALERT) {
                        info.alert_group_id = id;
                    }
                }
            }
            _ => {}
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::encode_attr;

    fn build_family_reply(family_id: u16, group_name: &str, group_id: u32) -> Vec<u8> {
        let mut group_fields = Vec::new();
        group_fields.extend(encode_attr(
            CTRL_ATTR_MCAST_GRP_NAME,
            format!("{group_name}\0").as_bytes(),
        ));
        group_fields.extend(encode_attr(CTRL_ATTR_MCAST_GRP_ID, &group_id.to_ne_bytes()));
        let group_attr = encode_attr(1, &group_fields);

        let mut payload = vec![0u8; GENL_HDRLEN];
        payload.extend(encode_attr(CTRL_ATTR_FAMILY_ID, &family_id.to_ne_bytes()));
        payload.extend(encode_attr(CTRL_ATTR_MCAST_GROUPS, &group_attr));
        payload
    }

    #[test]
    fn dm_origin_round_trips_known_values() {
        assert_eq!(DmOrigin::from_raw(NET_DM_ORIGIN_SOFTWARE), Some(DmOrigin::Software));
        assert_eq!(DmOrigin::from_raw(NET_DM_ORIGIN_HARDWARE), Some(DmOrigin::Hardware));
        assert_eq!(DmOrigin::from_raw(99), None);
    }

    #[test]
    fn parses_family_id_and_alert_group() {
        let payload = build_family_reply(0x20, NET_DM_GRP_ALERT, 7);
        let info = parse_family_reply(&payload);
        assert_eq!(info.family_id, Some(0x20));
        assert_eq!(info.alert_group_id, Some(7));
    }

    #[test]
    fn ignores_unrelated_multicast_groups() {
        let payload = build_family_reply(0x20, "notify", 3);
        let info = parse_family_reply(&payload);
        assert_eq!(info.family_id, Some(0x20));
        assert_eq!(info.alert_group_id, None);
    }
}
