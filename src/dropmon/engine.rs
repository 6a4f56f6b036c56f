// Copyright 2025-Present the netlink-telemetry authors.
// SPDX-License-Identifier: Apache-2.0

//! The Drop-Monitor finite state machine.

use crate::config::DropMonConfig;
use crate::error::NetlinkError;
use crate::netlink::message::{
    attr_cstr, attr_u16, attr_u32, encode_attr, parse_error_payload, AttributeIter, NlMsg,
    NLMSG_DONE, NLMSG_ERROR, NLMSG_NOOP, NLM_F_ACK, NLM_F_REQUEST,
};
use crate::netlink::socket::{recv_batch, NetlinkFamily, NetlinkSocket};
use crate::ratelimit::{CircuitBreaker, RateController};
use crate::sflow::{
    DiscardEvent, FunctionElement, HeaderElement, Notifier, NotifierCache, SflowAgent,
    HEADER_PROTOCOL_ETHERNET_ISO8023,
};

use super::catalog::DropPointCatalog;
use super::protocol::*;
use super::reason::ReasonCode;

/// Ticks a family-discovery retry waits before trying again.
const WAIT_RETRY_TICKS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmState {
    Init,
    GetFamily,
    Wait { countdown: u32 },
    GotGroup { group: u32 },
    JoinGroup { group: u32 },
    Configure { group: u32 },
    Start { group: u32 },
    Run { group: u32 },
    Stop,
    /// Circuit breaker tripped; terminal for the process lifetime, with
    /// no automatic recovery.
    Disabled,
}

/// Fields decoded straight off an alert message's TLV stream, before the
/// cross-checks below are applied.
#[derive(Debug, Clone, Default)]
pub struct DecodedAlert {
    pub symbol: Option<String>,
    pub hw_group: Option<String>,
    pub hw_name: Option<String>,
    pub ifindex: Option<u32>,
    pub orig_len: Option<u32>,
    pub trunc_len: Option<u32>,
    pub payload: Vec<u8>,
    pub origin: u16,
    pub attrs_walked: u32,
}

impl DecodedAlert {
    pub fn is_hardware(&self) -> bool {
        self.origin == NET_DM_ORIGIN_HARDWARE
    }
}

/// Decodes one `NET_DM_CMD_ALERT` message's attribute stream. `payload`
/// is the message body starting at the `genlmsghdr`.
pub fn decode_alert_attrs(payload: &[u8]) -> DecodedAlert {
    let mut out = DecodedAlert::default();
    if payload.len() < GENL_HDRLEN {
        return out;
    }
    for attr in AttributeIter::new(&payload[GENL_HDRLEN..]) {
        out.attrs_walked += 1;
        match attr.attr_type {
            NET_DM_ATTR_SYMBOL => out.symbol = attr_cstr(attr.data).map(str::to_string),
            NET_DM_ATTR_IN_PORT => {
                // Leniently treat as nested even when the kernel omitted
                // NLA_F_NESTED.
                for field in AttributeIter::new(attr.data) {
                    if field.attr_type == NET_DM_ATTR_PORT_NETDEV_IFINDEX {
                        out.ifindex = attr_u32(field.data);
                    }
                }
            }
            NET_DM_ATTR_PAYLOAD => out.payload = attr.data.to_vec(),
            NET_DM_ATTR_TRUNC_LEN => out.trunc_len = attr_u32(attr.data),
            NET_DM_ATTR_ORIG_LEN => out.orig_len = attr_u32(attr.data),
            NET_DM_ATTR_HW_TRAP_GROUP_NAME => {
                out.hw_group = attr_cstr(attr.data).map(str::to_string)
            }
            NET_DM_ATTR_HW_TRAP_NAME => out.hw_name = attr_cstr(attr.data).map(str::to_string),
            NET_DM_ATTR_ORIGIN => {
                if let Some(v) = attr_u16(attr.data) {
                    out.origin = v;
                }
            }
            _ => {}
        }
    }
    out
}

/// The header/frame-length fields after the cross-checks below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossChecked {
    pub frame_length: u32,
    pub header_length: u32,
    pub header_protocol: u32,
}

/// Applies the four cross-checks. `frame_length` has no independent
/// source attribute (the kernel alert carries `ORIG_LEN`, not a frame
/// length), so it starts at zero, is first defaulted to the header
/// length, then raised again if `ORIG_LEN` is larger. `header_protocol`
/// is always defaulted to Ethernet regardless of any decoded protocol
/// hint -- there is no independent attribute path for it either.
pub fn apply_cross_checks(alert: &DecodedAlert) -> CrossChecked {
    let mut header_length = alert.payload.len() as u32;
    let mut frame_length = 0u32;
    if frame_length == 0 {
        frame_length = header_length;
    }
    if let Some(trunc) = alert.trunc_len {
        if trunc != 0 && trunc < header_length {
            header_length = trunc;
        }
    }
    if let Some(orig) = alert.orig_len {
        if orig != 0 && orig > frame_length {
            frame_length = orig;
        }
    }
    CrossChecked {
        frame_length,
        header_length,
        header_protocol: HEADER_PROTOCOL_ETHERNET_ISO8023,
    }
}

/// Runs one decoded alert through catalog lookup, rate limiting and
/// notifier dispatch. Returns `true` if an event was actually emitted
/// (used to drive the START -> RUN transition).
pub fn process_drop_event<N: Notifier + Clone, A: SflowAgent<N>>(
    catalog: &mut DropPointCatalog,
    rate: &mut RateController,
    breaker: &mut CircuitBreaker,
    notifiers: &mut NotifierCache<N>,
    agent: &A,
    alert: &DecodedAlert,
) -> bool {
    breaker.record(alert.attrs_walked);

    tracing::debug!(
        origin = ?DmOrigin::from_raw(alert.origin),
        symbol = alert.symbol.as_deref().unwrap_or(""),
        "decoded drop alert"
    );

    let reason = if alert.is_hardware() {
        catalog.lookup_hw(alert.hw_group.as_deref(), alert.hw_name.as_deref().unwrap_or(""))
    } else {
        catalog.lookup_sw(alert.symbol.as_deref().unwrap_or(""))
    };

    let reason_code = match reason {
        Some(ReasonCode::Known(code)) => code,
        Some(ReasonCode::None) | None => return false,
    };

    let Some(drops) = rate.try_consume() else {
        return false;
    };

    let cross = apply_cross_checks(alert);
    let ifindex = alert.ifindex.unwrap_or(0);
    let notifier = notifiers.get_or_create(agent, ifindex);
    let header_length = cross.header_length.min(notifier.max_header_size());
    let header_bytes = alert.payload[..header_length as usize].to_vec();

    let event = DiscardEvent {
        reason: reason_code,
        input_ifindex: ifindex,
        drops,
        header: HeaderElement {
            header_protocol: cross.header_protocol,
            frame_length: cross.frame_length,
            stripped: PAYLOAD_STRIPPED_BYTES,
            header_length,
            header_bytes,
        },
        function: if alert.is_hardware() {
            None
        } else {
            alert
                .symbol
                .clone()
                .map(|symbol| FunctionElement { symbol })
        },
    };

    notifier.write_event_sample(&event);
    true
}

/// Builds and sends a generic-netlink request on `sock`.
fn send_genl(
    sock: &NetlinkSocket,
    msg_type: u16,
    cmd: u8,
    seq: u32,
    attrs: &[u8],
) -> Result<(), NetlinkError> {
    let mut payload = vec![cmd, 0, 0, 0];
    payload.extend_from_slice(attrs);
    let total_len = 16 + payload.len();
    let mut buf = Vec::with_capacity(total_len);
    buf.extend_from_slice(&(total_len as u32).to_ne_bytes());
    buf.extend_from_slice(&msg_type.to_ne_bytes());
    buf.extend_from_slice(&(NLM_F_REQUEST | NLM_F_ACK).to_ne_bytes());
    buf.extend_from_slice(&seq.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());
    buf.extend_from_slice(&payload);
    sock.send_raw(&buf)?;
    Ok(())
}

/// The Drop-Monitor protocol engine.
pub struct DropMonitorEngine<N> {
    state: DmState,
    sock: Option<NetlinkSocket>,
    family_id: Option<u16>,
    request_sent: bool,
    config: DropMonConfig,
    catalog: DropPointCatalog,
    rate: RateController,
    breaker: CircuitBreaker,
    notifiers: NotifierCache<N>,
    feed_control_errors: u32,
}

impl<N: Notifier + Clone> DropMonitorEngine<N> {
    pub fn new(config: DropMonConfig, catalog: DropPointCatalog) -> Self {
        let rate = RateController::new(config.limit);
        let breaker = CircuitBreaker::new(config.max);
        DropMonitorEngine {
            state: DmState::Init,
            sock: None,
            family_id: None,
            request_sent: false,
            config,
            catalog,
            rate,
            breaker,
            notifiers: NotifierCache::new(),
            feed_control_errors: 0,
        }
    }

    pub fn state(&self) -> DmState {
        self.state
    }

    pub fn feed_control_errors(&self) -> u32 {
        self.feed_control_errors
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, DmState::Disabled)
    }

    /// Initial configuration and subsequent config-change ingress event.
    pub fn on_config_changed(&mut self, config: DropMonConfig) {
        self.rate.set_limit(config.limit);
        self.breaker.set_max(config.max);
        let entering = matches!(self.state, DmState::Init) && config.group != 0;
        self.config = config;
        if entering {
            self.state = DmState::GetFamily;
        }
    }

    fn ensure_socket(&mut self) -> Result<&NetlinkSocket, NetlinkError> {
        if self.sock.is_none() {
            self.sock = Some(NetlinkSocket::open(NetlinkFamily::Generic)?);
        }
        let Some(sock) = self.sock.as_ref() else {
            unreachable!("just inserted above")
        };
        Ok(sock)
    }

    fn send_get_family(&mut self) -> Result<(), NetlinkError> {
        let sock = self.ensure_socket()?;
        let seq = sock.next_seq();
        let attrs = encode_attr(
            CTRL_ATTR_FAMILY_NAME,
            format!("{NET_DM_FAMILY_NAME}\0").as_bytes(),
        );
        send_genl(sock, GENL_ID_CTRL, CTRL_CMD_GETFAMILY, seq, &attrs)
    }

    fn send_config(&mut self, family_id: u16) -> Result<(), NetlinkError> {
        let sock = self.ensure_socket()?;
        let seq = sock.next_seq();
        let mut attrs = Vec::new();
        attrs.extend(encode_attr(NET_DM_ATTR_TRUNC_LEN, &DEFAULT_TRUNC_LEN.to_ne_bytes()));
        attrs.extend(encode_attr(NET_DM_ATTR_QUEUE_LEN, &DEFAULT_QUEUE_LEN.to_ne_bytes()));
        attrs.extend(encode_attr(
            NET_DM_ATTR_ALERT_MODE,
            &[NET_DM_ALERT_MODE_PACKET],
        ));
        send_genl(sock, family_id, NET_DM_CMD_CONFIG, seq, &attrs)
    }

    fn send_start_stop(&mut self, family_id: u16, cmd: u8) -> Result<(), NetlinkError> {
        let config = self.config;
        let sock = self.ensure_socket()?;
        let seq = sock.next_seq();
        let mut attrs = Vec::new();
        if config.sw {
            attrs.extend(encode_attr(NET_DM_ATTR_SW_DROPS, &[]));
        }
        if config.hw {
            attrs.extend(encode_attr(NET_DM_ATTR_HW_DROPS, &[]));
        }
        send_genl(sock, family_id, cmd, seq, &attrs)
    }

    /// 1Hz tick: refills the rate controller, checks the circuit breaker,
    /// and drives the state machine's retry/handshake transitions.
    pub fn on_tick(&mut self) {
        self.rate.on_tick();
        if self.breaker.on_tick() {
            tracing::error!("circuit breaker tripped, disabling drop-monitor engine");
            self.issue_stop_if_owned();
            self.state = DmState::Disabled;
            return;
        }
        if self.is_disabled() {
            return;
        }

        match self.state {
            DmState::Init | DmState::Stop | DmState::Disabled => {}
            DmState::GetFamily => {
                if !self.request_sent {
                    if self.send_get_family().is_ok() {
                        self.request_sent = true;
                    } else {
                        self.state = DmState::Wait {
                            countdown: WAIT_RETRY_TICKS,
                        };
                    }
                } else {
                    self.state = DmState::Wait {
                        countdown: WAIT_RETRY_TICKS,
                    };
                }
            }
            DmState::Wait { countdown } => {
                if countdown <= 1 {
                    self.request_sent = false;
                    self.state = DmState::GetFamily;
                } else {
                    self.state = DmState::Wait {
                        countdown: countdown - 1,
                    };
                }
            }
            DmState::GotGroup { group } => {
                if !self.config.start {
                    self.state = DmState::Run { group };
                } else {
                    match self.sock.as_ref().map(|s| s.join_group(group)) {
                        Some(Ok(())) => self.state = DmState::JoinGroup { group },
                        _ => {
                            self.state = DmState::Wait {
                                countdown: WAIT_RETRY_TICKS,
                            }
                        }
                    }
                }
            }
            DmState::JoinGroup { group } => {
                let family_id = self.family_id.unwrap_or(group as u16);
                let _ = self.send_config(family_id);
                self.state = DmState::Configure { group };
            }
            DmState::Configure { group } => {
                let family_id = self.family_id.unwrap_or(group as u16);
                let _ = self.send_start_stop(family_id, NET_DM_CMD_START);
                self.state = DmState::Start { group };
            }
            DmState::Start { .. } | DmState::Run { .. } => {}
        }
    }

    /// 10Hz deci tick: refills the rate controller's quota when `limit >= 10`.
    pub fn on_deci(&mut self) {
        self.rate.on_deci();
    }

    /// Drains the socket and dispatches decoded messages.
    pub fn on_recv<A: SflowAgent<N>>(&mut self, agent: &A) -> Result<usize, NetlinkError> {
        if self.is_disabled() {
            return Ok(0);
        }
        let Some(sock) = self.sock.take() else {
            return Ok(0);
        };

        let in_get_family = matches!(self.state, DmState::GetFamily);
        let expect_family_id = self.family_id;
        let mut errors_seen = 0u32;
        let mut family_reply: Option<FamilyInfo> = None;
        let mut alerts: Vec<DecodedAlert> = Vec::new();

        let handled = recv_batch(&sock, |msg: NlMsg<'_>| match msg.header.msg_type {
            NLMSG_ERROR => {
                if let Some(err) = parse_error_payload(msg.payload) {
                    if err != 0 {
                        tracing::warn!(errno = err, "netlink NLMSG_ERROR reply");
                        errors_seen += 1;
                    }
                }
            }
            NLMSG_DONE | NLMSG_NOOP => {}
            GENL_ID_CTRL if in_get_family => {
                family_reply = Some(parse_family_reply(msg.payload));
            }
            mt if Some(mt) == expect_family_id => {
                if msg.payload.first() == Some(&NET_DM_CMD_ALERT) {
                    alerts.push(decode_alert_attrs(msg.payload));
                }
            }
            _ => {}
        });
        self.sock = Some(sock);
        let handled = handled?;

        if let Some(info) = family_reply {
            if let (Some(fid), Some(group)) = (info.family_id, info.alert_group_id) {
                tracing::debug!(family_id = fid, group, "resolved NET_DM family");
                self.family_id = Some(fid);
                self.state = DmState::GotGroup { group };
                self.request_sent = false;
            }
        }
        if matches!(self.state, DmState::Configure { .. } | DmState::Start { .. }) {
            self.feed_control_errors = self.feed_control_errors.saturating_add(errors_seen);
        }

        let mut became_run = false;
        for alert in &alerts {
            let emitted = process_drop_event(
                &mut self.catalog,
                &mut self.rate,
                &mut self.breaker,
                &mut self.notifiers,
                agent,
                alert,
            );
            if emitted {
                became_run = true;
            }
        }
        if became_run {
            if let DmState::Start { group } = self.state {
                self.state = DmState::Run { group };
            }
        }
        Ok(handled)
    }

    fn issue_stop_if_owned(&mut self) {
        if self.config.start && self.feed_control_errors == 0 {
            if let Some(family_id) = self.family_id {
                let _ = self.send_start_stop(family_id, NET_DM_CMD_STOP);
            }
        }
    }

    /// `final` shutdown event: sends `CMD_STOP` if this engine owns the
    /// feed and never saw a control error, then closes the socket. A
    /// circuit-breaker trip already sent `CMD_STOP` from `on_tick`, so a
    /// disabled engine closes the socket without sending it again.
    pub fn on_final(&mut self) {
        if self.is_disabled() {
            self.sock = None;
            return;
        }
        self.issue_stop_if_owned();
        self.state = DmState::Stop;
        self.sock = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropmon::catalog::{DropPointCatalog, SourceEntry};
    use crate::netlink::message::encode_attr;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct TestNotifier {
        max_header_size: u32,
        events: Rc<RefCell<Vec<DiscardEvent>>>,
    }

    impl Notifier for TestNotifier {
        fn max_header_size(&self) -> u32 {
            self.max_header_size
        }
        fn write_event_sample(&self, event: &DiscardEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    struct TestAgent {
        max_header_size: u32,
    }

    impl TestAgent {
        fn new() -> Self {
            TestAgent { max_header_size: 256 }
        }
    }

    impl SflowAgent<TestNotifier> for TestAgent {
        fn add_notifier(&self, _ifindex: u32) -> TestNotifier {
            TestNotifier {
                max_header_size: self.max_header_size,
                events: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    fn build_alert_payload(
        symbol: &str,
        ifindex: u32,
        payload_bytes: &[u8],
        trunc_len: u32,
        orig_len: u32,
    ) -> Vec<u8> {
        let mut msg = vec![NET_DM_CMD_ALERT, 0, 0, 0];
        msg.extend(encode_attr(NET_DM_ATTR_SYMBOL, format!("{symbol}\0").as_bytes()));
        let port_inner = encode_attr(NET_DM_ATTR_PORT_NETDEV_IFINDEX, &ifindex.to_ne_bytes());
        msg.extend(encode_attr(NET_DM_ATTR_IN_PORT, &port_inner));
        msg.extend(encode_attr(NET_DM_ATTR_PAYLOAD, payload_bytes));
        msg.extend(encode_attr(NET_DM_ATTR_TRUNC_LEN, &trunc_len.to_ne_bytes()));
        msg.extend(encode_attr(NET_DM_ATTR_ORIG_LEN, &orig_len.to_ne_bytes()));
        msg
    }

    #[test]
    fn scenario_sw_drop_recognized_via_exact_symbol() {
        let payload_bytes = vec![0xABu8; 42];
        let msg = build_alert_payload("kfree_skb_reason", 7, &payload_bytes, 128, 1500);
        let alert = decode_alert_attrs(&msg);
        assert_eq!(alert.symbol.as_deref(), Some("kfree_skb_reason"));
        assert_eq!(alert.ifindex, Some(7));
        assert_eq!(alert.payload.len(), 42);

        let (mut catalog, _) = DropPointCatalog::load(
            &[SourceEntry {
                op: "==",
                symbol: "kfree_skb_reason",
                reason_name: "unknown",
            }],
            &[],
            true,
            true,
        );
        let mut rate = RateController::new(100);
        let mut breaker = CircuitBreaker::new(0);
        let mut notifiers: NotifierCache<TestNotifier> = NotifierCache::new();
        let agent = TestAgent::new();

        let emitted = process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert);
        assert!(emitted);

        let notifier = notifiers.get_or_create(&agent, 7);
        let events = notifier.events.borrow();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.input_ifindex, 7);
        assert_eq!(event.header.header_length, 42);
        assert_eq!(event.header.frame_length, 1500);
        assert_eq!(event.function.as_ref().unwrap().symbol, "kfree_skb_reason");
    }

    #[test]
    fn header_length_clamped_to_notifier_max_header_size() {
        let payload_bytes = vec![0xABu8; 42];
        let msg = build_alert_payload("kfree_skb_reason", 7, &payload_bytes, 128, 1500);
        let alert = decode_alert_attrs(&msg);

        let (mut catalog, _) = DropPointCatalog::load(
            &[SourceEntry {
                op: "==",
                symbol: "kfree_skb_reason",
                reason_name: "unknown",
            }],
            &[],
            true,
            true,
        );
        let mut rate = RateController::new(100);
        let mut breaker = CircuitBreaker::new(0);
        let mut notifiers: NotifierCache<TestNotifier> = NotifierCache::new();
        let agent = TestAgent { max_header_size: 16 };

        assert!(process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert));

        let notifier = notifiers.get_or_create(&agent, 7);
        let events = notifier.events.borrow();
        let event = &events[0];
        assert_eq!(event.header.header_length, 16);
        assert_eq!(event.header.header_bytes.len(), 16);
        // frame_length reflects the real, unclamped ORIG_LEN -- only the
        // captured header bytes are trimmed to the notifier's limit.
        assert_eq!(event.header.frame_length, 1500);
    }

    #[test]
    fn scenario_sw_pattern_materialization() {
        let (mut catalog, _) = DropPointCatalog::load(
            &[SourceEntry {
                op: "*=",
                symbol: "tcp_v?_rcv*",
                reason_name: "tcp_invalid_seq",
            }],
            &[],
            true,
            true,
        );
        let mut rate = RateController::new(100);
        let mut breaker = CircuitBreaker::new(0);
        let mut notifiers: NotifierCache<TestNotifier> = NotifierCache::new();
        let agent = TestAgent::new();

        let msg = build_alert_payload("tcp_v4_rcv_bad", 3, &[0u8; 10], 0, 0);
        let alert = decode_alert_attrs(&msg);

        assert!(process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert));
        assert!(catalog.sw_contains_exact("tcp_v4_rcv_bad"));
        assert!(process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert));

        let notifier = notifiers.get_or_create(&agent, 3);
        assert_eq!(notifier.events.borrow().len(), 2);
    }

    #[test]
    fn scenario_rate_limit_exposes_suppressed_count_on_next_emission() {
        let (mut catalog, _) = DropPointCatalog::load(
            &[SourceEntry {
                op: "==",
                symbol: "drop_a",
                reason_name: "unknown",
            }],
            &[],
            true,
            true,
        );
        let mut rate = RateController::new(2);
        let mut breaker = CircuitBreaker::new(0);
        let mut notifiers: NotifierCache<TestNotifier> = NotifierCache::new();
        let agent = TestAgent::new();

        let msg = build_alert_payload("drop_a", 1, &[0u8; 4], 0, 0);
        let alert = decode_alert_attrs(&msg);

        for _ in 0..2 {
            assert!(process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert));
        }
        for _ in 0..3 {
            process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert);
        }
        assert_eq!(rate.no_quota(), 3);

        rate.on_tick();
        assert!(process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert));
        let notifier = notifiers.get_or_create(&agent, 1);
        let events = notifier.events.borrow();
        assert_eq!(events.last().unwrap().drops, 3);
    }

    #[test]
    fn scenario_circuit_breaker_disables_engine() {
        let engine: DropMonitorEngine<TestNotifier> = DropMonitorEngine::new(
            DropMonConfig {
                max: 10,
                ..Default::default()
            },
            DropPointCatalog::load(&[], &[], true, true).0,
        );
        let mut engine = engine;
        engine.breaker.record(11);
        engine.on_tick();
        assert!(engine.is_disabled());
        let prior_state = engine.state();
        engine.on_tick();
        assert_eq!(engine.state(), prior_state, "disabled engine is a no-op");
    }

    #[test]
    fn unrecognized_symbol_is_silently_discarded() {
        let (mut catalog, _) = DropPointCatalog::load(&[], &[], true, true);
        let mut rate = RateController::new(100);
        let mut breaker = CircuitBreaker::new(0);
        let mut notifiers: NotifierCache<TestNotifier> = NotifierCache::new();
        let agent = TestAgent::new();
        let msg = build_alert_payload("totally_unknown_symbol", 1, &[0u8; 4], 0, 0);
        let alert = decode_alert_attrs(&msg);
        assert!(!process_drop_event(&mut catalog, &mut rate, &mut breaker, &mut notifiers, &agent, &alert));
        assert_eq!(notifiers.len(), 0);
    }
}
