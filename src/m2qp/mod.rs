//! Mode-2 query protocol (M2QP): the transport layer.
//!
//! Request payload, after the network header:
//! ```text
//! [cmd][cmd-ext?][timeout][{chan-count, chans}?][ack-list?][query?][local-query?][body]
//! ```
//!
//! The command byte carries a 3-bit command type and a 4-bit opcode.  The
//! opcode's upper three bits select an opgroup, each with its own body
//! layout and response:
//!
//! | opgroup | body                      | response body          |
//! |---------|---------------------------|------------------------|
//! | 0       | ISF call (bit 0: series)  | ISF return             |
//! | 1       | `[dst][src][udp data]`    | empty                  |
//! | 2, 3    | ISF call; query on file (2) or series (3) | ISF return |
//! | 4, 5    | none                      | empty (datastream ack) |
//!
//! Queries are only carried by arbitrated (A2P) requests.

pub mod isf;
pub mod query;

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::StackConfig;
use crate::csma::{Comm, params};
use crate::error::QueueError;
use crate::m2np::{Addressing, DeviceId, Network, idcmp};
use crate::ports::{Ports, UserId};
use crate::queue::FrameQueue;
use crate::session::{NetState, Session, Substate, flags};
use crate::time::{Ti, timeout_decode};

use self::isf::IsfCall;
use self::query::{QueryTarget, QueryTemplate};

/// Responder IDs remembered for the next A2P round.
pub const MAX_ACKS: usize = 8;
/// Datastream reassembly buffer.
pub const DS_CAPACITY: usize = 512;
/// Last response payload kept for the requester.
pub const RESPONSE_CAPACITY: usize = 128;

/// Command byte and command-extension bits.
pub mod cmd {
    pub const EXT: u8 = 0x80;
    pub const TYPE: u8 = 0x70;
    pub const OPCODE: u8 = 0x0F;

    pub const TYPE_RESPONSE: u8 = 0x00;
    pub const TYPE_CONTROL: u8 = 0x10;
    pub const TYPE_NA2P: u8 = 0x20;
    pub const TYPE_A2P_INITIAL: u8 = 0x40;
    pub const TYPE_A2P_SUBSEQUENT: u8 = 0x50;

    pub const OP_ANNOUNCE_FILE: u8 = 0x00;
    pub const OP_ANNOUNCE_SERIES: u8 = 0x01;
    pub const OP_INVENTORY_UDP: u8 = 0x02;
    pub const OP_COLLECT_FILE: u8 = 0x04;
    pub const OP_COLLECT_SERIES: u8 = 0x06;
    pub const OP_DATASTREAM_INIT: u8 = 0x08;

    pub const EXT_NORESP: u8 = 0x01;
    pub const EXT_NACK: u8 = 0x02;
    pub const EXT_CSMA: u8 = 0x38;
}

/// Timeout-byte flag: a response channel list follows.
pub const TIMEOUT_CHANLIST: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Na2p,
    A2pInitial,
    A2pSubsequent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Response,
    Control,
    Request(RequestKind),
}

impl CommandType {
    /// `None` for reserved command types.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & cmd::TYPE {
            cmd::TYPE_RESPONSE => Some(Self::Response),
            cmd::TYPE_CONTROL => Some(Self::Control),
            cmd::TYPE_NA2P => Some(Self::Request(RequestKind::Na2p)),
            cmd::TYPE_A2P_INITIAL => Some(Self::Request(RequestKind::A2pInitial)),
            cmd::TYPE_A2P_SUBSEQUENT => Some(Self::Request(RequestKind::A2pSubsequent)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opgroup {
    Announcement,
    InventoryUdp,
    CollectionFile,
    CollectionSeries,
    DatastreamInit,
    Reserved,
}

impl Opgroup {
    pub const fn from_opcode(opcode: u8) -> Self {
        match (opcode & cmd::OPCODE) >> 1 {
            0 => Self::Announcement,
            1 => Self::InventoryUdp,
            2 => Self::CollectionFile,
            3 => Self::CollectionSeries,
            4 | 5 => Self::DatastreamInit,
            _ => Self::Reserved,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Command {
    pub code: u8,
    pub ext: u8,
}

impl Command {
    pub fn opcode(self) -> u8 {
        self.code & cmd::OPCODE
    }

    pub fn has(self, ext_bit: u8) -> bool {
        self.ext & ext_bit != 0
    }
}

// ---------------------------------------------------------------------------
// Transport state
// ---------------------------------------------------------------------------

/// Transport-layer state for the command in flight.  Reset at the start of
/// every parse; acks, datastream and the last response persist.
#[derive(Default)]
pub struct Transport {
    pub cmd: Command,
    pub qtmpl: QueryTemplate,
    pub qdata: QueryTarget,
    acks: Vec<DeviceId, MAX_ACKS>,
    ds: Vec<u8, DS_CAPACITY>,
    response: Vec<u8, RESPONSE_CAPACITY>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.cmd = Command::default();
        self.qtmpl = QueryTemplate::default();
        self.qdata = QueryTarget::default();
    }

    /// IDs of responders seen so far.
    pub fn acks(&self) -> &[DeviceId] {
        &self.acks
    }

    pub fn clear_acks(&mut self) {
        self.acks.clear();
    }

    /// Payload of the most recent response.
    pub fn response(&self) -> &[u8] {
        &self.response
    }

    /// Drain the reassembled datastream.
    pub fn take_datastream(&mut self) -> Vec<u8, DS_CAPACITY> {
        core::mem::take(&mut self.ds)
    }

    // ── Inbound ──────────────────────────────────────────────

    /// `m2qp_parse_frame`: dispatch an M2NP payload sitting in `net.rxq`.
    pub fn parse_frame(
        &mut self,
        net: &mut Network,
        session: &mut Session,
        comm: &mut Comm,
        netconf: &StackConfig,
        ports: &mut Ports<'_>,
    ) -> i16 {
        self.reset();
        let Ok(code) = net.rxq.read_byte() else {
            return -1;
        };
        let ext = if code & cmd::EXT != 0 {
            match net.rxq.read_byte() {
                Ok(e) => e,
                Err(_) => return -1,
            }
        } else {
            0
        };
        self.cmd = Command { code, ext };

        match CommandType::from_code(code) {
            Some(CommandType::Response) => self.parse_response(net, session),
            Some(CommandType::Control) => {
                info!(
                    "m2qp: control frame {:#04x} from {:02x?}, dropped",
                    code,
                    net.dlog_source.as_slice()
                );
                -1
            }
            Some(CommandType::Request(kind)) => {
                self.sub_parse_request(kind, net, session, comm, netconf, ports)
            }
            None => {
                debug!("m2qp: reserved command type {:#04x}", code);
                -1
            }
        }
    }

    /// M2DP continuation of an open datastream dialog.
    pub fn parse_dspkt(&mut self, net: &Network, session: &Session) -> i16 {
        if !session
            .netstate
            .contains(NetState::CONNECTED | NetState::DSDIALOG)
        {
            return -1;
        }
        if self.ds.extend_from_slice(net.rxq.unread()).is_err() {
            warn!("m2qp: datastream buffer full, dropping segment");
            return -1;
        }
        debug!("m2qp: datastream +{} bytes", net.rxq.remaining());
        0
    }

    fn parse_response(&mut self, net: &Network, session: &Session) -> i16 {
        if session.netstate.substate() != Substate::RespRx {
            debug!("m2qp: unsolicited response ignored");
            return -1;
        }
        let source = net.dlog_source;
        if !self.acks.contains(&source) && self.acks.push(source).is_err() {
            debug!("m2qp: ack list full");
        }
        let body = net.rxq.unread();
        let n = body.len().min(RESPONSE_CAPACITY);
        self.response.clear();
        // n <= capacity
        let _ = self.response.extend_from_slice(&body[..n]);
        0
    }

    fn sub_parse_request(
        &mut self,
        kind: RequestKind,
        net: &mut Network,
        session: &mut Session,
        comm: &mut Comm,
        netconf: &StackConfig,
        ports: &mut Ports<'_>,
    ) -> i16 {
        let group = Opgroup::from_opcode(self.cmd.opcode());
        if group == Opgroup::Reserved {
            debug!("m2qp: reserved opcode {:#04x}", self.cmd.opcode());
            return -1;
        }

        comm.csmaca_params = self.cmd.ext & cmd::EXT_CSMA;
        if kind != RequestKind::Na2p {
            comm.csmaca_params |= params::A2P;
        }
        comm.redundants.set(0);
        comm.rx_timeout = Ti::ZERO;
        if let Err(e) = read_response_template(&mut net.rxq, session, comm) {
            debug!("m2qp: truncated response template ({})", e);
            return -1;
        }

        let user = if net.header.is_secured() {
            UserId::User
        } else {
            UserId::Guest
        };

        let mut score = 0;
        if kind != RequestKind::Na2p {
            score = self.sub_process_query(kind, group, net, session, netconf, user, ports);
            if score < 0 {
                return score;
            }
        }

        let handled = match group {
            Opgroup::Announcement | Opgroup::CollectionFile | Opgroup::CollectionSeries => {
                self.reply_isf(net, session, netconf, user, ports)
            }
            Opgroup::InventoryUdp => self.reply_udp(net, session, netconf, ports),
            Opgroup::DatastreamInit => {
                session.netstate.insert(NetState::DSDIALOG);
                session.flags |= flags::LISTEN;
                self.ds.clear();
                self.respond(net, session, netconf, ports, |_, _| 0)
            }
            Opgroup::Reserved => -1,
        };
        if handled < 0 { handled } else { score }
    }

    /// `sub_process_query`: ack-list check, optional local query, then the
    /// global query.
    fn sub_process_query(
        &mut self,
        kind: RequestKind,
        group: Opgroup,
        net: &mut Network,
        session: &mut Session,
        netconf: &StackConfig,
        user: UserId,
        ports: &mut Ports<'_>,
    ) -> i16 {
        if kind == RequestKind::A2pSubsequent {
            match already_acked(&mut net.rxq, session, netconf) {
                Ok(false) => {}
                Ok(true) => {
                    debug!("m2qp: already acknowledged, staying quiet");
                    session.flags &= !flags::LISTEN;
                    return -1;
                }
                Err(_) => return -1,
            }
        }

        let on_series = group == Opgroup::CollectionSeries;
        if kind == RequestKind::A2pInitial {
            let local = self.run_query(&mut net.rxq, on_series, user, ports);
            if local < 0 {
                return local;
            }
        }
        self.run_query(&mut net.rxq, on_series, user, ports)
    }

    fn run_query(
        &mut self,
        rxq: &mut FrameQueue,
        on_series: bool,
        user: UserId,
        ports: &mut Ports<'_>,
    ) -> i16 {
        let parsed = QueryTemplate::parse(rxq)
            .and_then(|t| QueryTarget::parse(rxq, on_series).map(|target| (t, target)));
        match parsed {
            Ok((tmpl, target)) => {
                self.qtmpl = tmpl;
                self.qdata = target;
            }
            Err(e) => {
                debug!("m2qp: malformed query ({})", e);
                return -1;
            }
        }
        self.isf_comp(user, ports)
    }

    /// Run the loaded query against the local file store.
    pub fn isf_comp(&self, user: UserId, ports: &mut Ports<'_>) -> i16 {
        query::isf_comp(&self.qtmpl, &self.qdata, user, ports.fs, ports.auth)
    }

    /// Parse a call template from `net.rxq` and append its return to
    /// `net.txq`.
    pub fn isf_call(
        &mut self,
        is_series: bool,
        net: &mut Network,
        user: UserId,
        ports: &mut Ports<'_>,
    ) -> i16 {
        match IsfCall::parse(&mut net.rxq, is_series) {
            Ok(call) => isf::isf_return(&call, &mut net.txq, user, ports.fs, ports.auth),
            Err(_) => -1,
        }
    }

    // ── Responses ────────────────────────────────────────────

    fn reply_isf(
        &mut self,
        net: &mut Network,
        session: &mut Session,
        netconf: &StackConfig,
        user: UserId,
        ports: &mut Ports<'_>,
    ) -> i16 {
        let series = self.cmd.opcode() & 0x01 != 0;
        let Ok(call) = IsfCall::parse(&mut net.rxq, series) else {
            return -1;
        };
        self.respond(net, session, netconf, ports, |txq, ports| {
            isf::isf_return(&call, txq, user, ports.fs, ports.auth)
        })
    }

    fn reply_udp(
        &mut self,
        net: &mut Network,
        session: &mut Session,
        netconf: &StackConfig,
        ports: &mut Ports<'_>,
    ) -> i16 {
        let (Ok(dst), Ok(src)) = (net.rxq.read_byte(), net.rxq.read_byte()) else {
            return -1;
        };
        let delivered = match ports.udp.as_deref_mut() {
            Some(udp) => udp.udp_receive(&net.dlog_source, src, dst, net.rxq.unread()),
            None => false,
        };
        if !delivered {
            warn!("m2qp: no UDP listener on port {}", dst);
            return -1;
        }
        self.respond(net, session, netconf, ports, |_, _| 0)
    }

    /// Stage a unicast response: header, response command byte, `body`,
    /// footer.  With NORESP the session is scrapped instead.
    fn respond(
        &mut self,
        net: &mut Network,
        session: &mut Session,
        netconf: &StackConfig,
        ports: &mut Ports<'_>,
        body: impl FnOnce(&mut FrameQueue, &mut Ports<'_>) -> i16,
    ) -> i16 {
        if self.cmd.has(cmd::EXT_NORESP) {
            session.scrap();
            return 0;
        }
        if let Err(e) = net.header(
            session,
            Addressing::Unicast,
            self.cmd.has(cmd::EXT_NACK),
            netconf,
        ) {
            warn!("m2qp: response header failed: {}", e);
            return -1;
        }
        if net
            .txq
            .write_byte(cmd::TYPE_RESPONSE | self.cmd.opcode())
            .is_err()
        {
            return -1;
        }
        let written = body(&mut net.txq, ports);
        if written < 0 {
            return written;
        }
        if let Err(e) = net.footer(ports.security.as_deref_mut()) {
            warn!("m2qp: response footer failed: {}", e);
            return -1;
        }
        session.netstate.set_substate(Substate::RespTx);
        0
    }

    // ── Outbound requests ────────────────────────────────────

    /// Command, optional extension and timeout bytes of a request.
    pub fn write_request(
        txq: &mut FrameQueue,
        code: u8,
        ext: Option<u8>,
        timeout: u8,
    ) -> Result<(), QueueError> {
        match ext {
            Some(e) => {
                txq.write_byte(code | cmd::EXT)?;
                txq.write_byte(e)?;
            }
            None => txq.write_byte(code & !cmd::EXT)?,
        }
        txq.write_byte(timeout & !TIMEOUT_CHANLIST)
    }

    /// Ack list for an A2P subsequent request.
    pub fn write_ack_list(&self, txq: &mut FrameQueue, use_vid: bool) -> Result<(), QueueError> {
        let len = if use_vid { 2 } else { 8 };
        let ids = self.acks.iter().filter(|id| id.as_slice().len() == len);
        txq.write_byte(ids.clone().count() as u8)?;
        for id in ids {
            txq.write_bytes(id.as_slice())?;
        }
        Ok(())
    }
}

/// Timeout byte plus optional response channel list.
fn read_response_template(
    rxq: &mut FrameQueue,
    session: &Session,
    comm: &mut Comm,
) -> Result<(), QueueError> {
    let code = rxq.read_byte()?;
    comm.tc = timeout_decode(code).to_clk();
    if code & TIMEOUT_CHANLIST == 0 {
        comm.set_tx_channel(session.channel);
        return Ok(());
    }
    let count = usize::from(rxq.read_byte()?);
    let chans = rxq.read_bytes(count)?;
    comm.tx_channels.clear();
    for &ch in chans.iter().take(comm.tx_channels.capacity()) {
        // bounded by capacity
        let _ = comm.tx_channels.push(ch);
    }
    if comm.tx_channels.is_empty() {
        comm.set_tx_channel(session.channel);
    }
    Ok(())
}

/// Scan an A2P ack list for this device's ID.
fn already_acked(
    rxq: &mut FrameQueue,
    session: &Session,
    netconf: &StackConfig,
) -> Result<bool, QueueError> {
    let count = rxq.read_byte()?;
    let len = if session.flags & flags::VID != 0 { 2 } else { 8 };
    let mut found = false;
    for _ in 0..count {
        found |= idcmp(netconf, rxq.read_bytes(len)?);
    }
    Ok(found)
}
