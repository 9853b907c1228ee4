//! Mode-2 network frame codec (M2NP / M2DP).
//!
//! Wire format:
//! ```text
//! ┌─────┬────┬────────┬────────────┬─────────┬───────────┬──────────┬──────────┬─────────┬─────────┬────────┐
//! │ len │ lc │ subnet │ frame-info │ ext 0-1 │ dialog-id │ key 0-1  │ src 2|8  │ tgt 0-8 │ routing │payload │ crc 2
//! └─────┴────┴────────┴────────────┴─────────┴───────────┴──────────┴──────────┴─────────┴─────────┴────────┘
//! ```
//!
//! `len` counts the whole frame including itself and the CRC.  The CRC
//! bytes are reserved here and filled by the radio encoder.  M2DP
//! (datastream) frames stop after the dialog ID.

use log::{debug, warn};

use crate::config::StackConfig;
use crate::csma::Comm;
use crate::error::{FrameError, QueueError};
use crate::m2qp::Transport;
use crate::ports::{Ports, SecurityPort};
use crate::queue::FrameQueue;
use crate::session::{NetState, Session, flags};

/// Largest frame the codec will stage.
pub const MAX_PAYLOAD: usize = 254;
/// Largest frame when block (RS) coding is active.
pub const MAX_PAYLOAD_RS: usize = 221;
/// Reserved CRC trailer.
pub const FOOTER_LEN: usize = 2;
/// len, lc, subnet, frame-info, dialog-id.
const MIN_HEADER: usize = 5;

/// Frame-info bits.
pub mod fi {
    pub const LISTEN: u8 = 0x80;
    pub const DLLS: u8 = 0x40;
    pub const NLS: u8 = 0x20;
    pub const VID: u8 = 0x10;
    pub const EXT: u8 = 0x08;
    pub const ADDR: u8 = 0x06;
    pub const FRTYPE: u8 = 0x01;
    pub const M2NP: u8 = 0x00;
    pub const M2DP: u8 = 0x01;
}

/// Extension-byte bits.
pub mod ext {
    pub const ROUTE: u8 = 0x80;
    pub const RSCODE: u8 = 0x40;
    pub const NACK: u8 = 0x20;
}

/// Hop-code bits.
pub mod hop {
    pub const EXT: u8 = 0x80;
    pub const ORIGIN: u8 = 0x40;
    pub const DEST: u8 = 0x20;
    pub const COUNT: u8 = 0x0F;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    #[default]
    Unicast,
    Broadcast,
    Anycast,
    Multicast,
}

impl Addressing {
    pub const fn from_frame_info(fi_byte: u8) -> Self {
        match (fi_byte & fi::ADDR) >> 1 {
            0 => Self::Unicast,
            1 => Self::Broadcast,
            2 => Self::Anycast,
            _ => Self::Multicast,
        }
    }

    pub const fn bits(self) -> u8 {
        (self as u8) << 1
    }
}

// ---------------------------------------------------------------------------
// Device IDs
// ---------------------------------------------------------------------------

/// A 2-byte VID or 8-byte UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceId {
    len: u8,
    bytes: [u8; 8],
}

impl DeviceId {
    pub const fn vid(v: [u8; 2]) -> Self {
        Self {
            len: 2,
            bytes: [v[0], v[1], 0, 0, 0, 0, 0, 0],
        }
    }

    pub const fn uid(u: [u8; 8]) -> Self {
        Self { len: 8, bytes: u }
    }

    /// `None` unless `id` is 2 or 8 bytes.
    pub fn from_slice(id: &[u8]) -> Option<Self> {
        match id.len() {
            2 => Some(Self::vid([id[0], id[1]])),
            8 => {
                let mut u = [0u8; 8];
                u.copy_from_slice(id);
                Some(Self::uid(u))
            }
            _ => None,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    pub fn is_vid(&self) -> bool {
        self.len == 2
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Local source ID for a dialog: VID if the dialog uses VIDs.
pub fn local_id(netconf: &StackConfig, use_vid: bool) -> DeviceId {
    if use_vid {
        DeviceId::vid(netconf.device.vid)
    } else {
        DeviceId::uid(netconf.device.uid)
    }
}

/// `m2np_idcmp`: does `id` name this device?
///
/// A zero VID is "unassigned" and never matches, on either side.  The
/// byte compare visits every byte regardless of where a mismatch is.
pub fn idcmp(netconf: &StackConfig, id: &[u8]) -> bool {
    let local: &[u8] = match id.len() {
        2 => {
            if netconf.device.vid == [0, 0] || id == [0, 0] {
                return false;
            }
            &netconf.device.vid
        }
        8 => &netconf.device.uid,
        _ => return false,
    };
    local.iter().zip(id).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Subnet filter: specifier nibble must match (or be `F`), and every mask
/// bit in the frame must be present in the device subnet.
pub fn subnet_matches(frame: u8, device: u8) -> bool {
    let spec_ok = frame >> 4 == 0x0F || frame >> 4 == device >> 4;
    let mask = frame & 0x0F;
    spec_ok && (mask & device) == mask
}

// ---------------------------------------------------------------------------
// Routing state
// ---------------------------------------------------------------------------

/// Parsed multi-hop block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteInfo {
    pub hop_code: u8,
    pub hop_ext: u8,
    pub origin: Option<DeviceId>,
    pub dest: Option<DeviceId>,
}

impl RouteInfo {
    pub fn hops_remaining(&self) -> u8 {
        self.hop_code & hop::COUNT
    }
}

/// Summary of the last inbound header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderInfo {
    pub subnet: u8,
    pub frame_info: u8,
    pub ext: u8,
    pub addressing: Addressing,
    pub dialog_id: u8,
    pub key_index: Option<u8>,
}

impl HeaderInfo {
    pub fn is_secured(&self) -> bool {
        self.key_index.is_some()
    }
}

/// What the header parse decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inbound {
    /// Addressed here: hand to the transport layer.
    Local,
    /// Datastream continuation.
    Datastream,
    /// Routing block names another destination.
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reject {
    Length,
    Subnet,
    Dialog,
    Security,
    Address,
    Truncated,
}

impl From<QueueError> for Reject {
    fn from(_: QueueError) -> Self {
        Self::Truncated
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Network-layer state: the two frame queues plus per-dialog caches.
#[derive(Default)]
pub struct Network {
    pub txq: FrameQueue,
    pub rxq: FrameQueue,
    /// Source of the last inbound frame; target of unicast replies.
    pub dlog_source: DeviceId,
    pub route: RouteInfo,
    pub header: HeaderInfo,
    tx_lc: u8,
    tx_key: Option<u8>,
    tx_secure_start: usize,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free bytes for payload after reserving the footer.
    pub fn payload_space(&self) -> usize {
        self.txq.space().saturating_sub(FOOTER_LEN)
    }

    /// `m2np_header`: stage a fresh frame header in `txq`.
    pub fn header(
        &mut self,
        session: &mut Session,
        addressing: Addressing,
        nack: bool,
        netconf: &StackConfig,
    ) -> Result<(), FrameError> {
        let secure = session.flags & (flags::DLLS | flags::NLS);
        if secure == flags::DLLS | flags::NLS {
            return Err(FrameError::SecurityConflict);
        }

        self.txq.empty();
        let limit = if session.flags & flags::RSCODE != 0 {
            MAX_PAYLOAD_RS
        } else {
            MAX_PAYLOAD
        };
        self.txq.set_limit(limit)?;
        self.txq.write_byte(0)?; // length, patched by footer
        self.txq.write_byte(0)?; // link control, patched by footer
        self.tx_lc = netconf.tx_eirp;
        self.txq.write_byte(session.subnet)?;

        let route = session.flags & flags::ROUTE != 0 && netconf.multihop;
        let mut ext_byte = 0;
        if route {
            ext_byte |= ext::ROUTE;
        }
        if session.flags & flags::RSCODE != 0 {
            ext_byte |= ext::RSCODE;
        }
        if nack {
            ext_byte |= ext::NACK;
        }

        let use_vid = session.flags & flags::VID != 0;
        let mut fi_byte = addressing.bits() | fi::M2NP;
        if session.flags & flags::LISTEN != 0 {
            fi_byte |= fi::LISTEN;
        }
        if secure & flags::DLLS != 0 {
            fi_byte |= fi::DLLS;
        }
        if secure & flags::NLS != 0 {
            fi_byte |= fi::NLS;
        }
        if use_vid {
            fi_byte |= fi::VID;
        }
        if ext_byte != 0 {
            fi_byte |= fi::EXT;
        }
        self.txq.write_byte(fi_byte)?;
        if ext_byte != 0 {
            self.txq.write_byte(ext_byte)?;
        }

        if session.is_connected() {
            session.dialog_id = session.dialog_id.wrapping_add(1);
        } else {
            session.netstate.insert(NetState::CONNECTED);
        }
        self.txq.write_byte(session.dialog_id)?;

        self.tx_key = None;
        if secure != 0 {
            self.txq.write_byte(netconf.key_index)?;
            self.tx_key = Some(netconf.key_index);
            self.tx_secure_start = self.txq.put_cursor();
        }

        self.txq
            .write_bytes(local_id(netconf, use_vid).as_slice())?;
        if addressing == Addressing::Unicast {
            self.txq.write_bytes(self.dlog_source.as_slice())?;
        }

        if route {
            let mut hop_code = self.route.hop_code & (hop::EXT | hop::COUNT);
            if self.route.origin.is_some() {
                hop_code |= hop::ORIGIN;
            }
            if self.route.dest.is_some() {
                hop_code |= hop::DEST;
            }
            self.txq.write_byte(hop_code)?;
            if hop_code & hop::EXT != 0 {
                self.txq.write_byte(self.route.hop_ext)?;
            }
            if let Some(origin) = self.route.origin {
                self.txq.write_bytes(origin.as_slice())?;
            }
            if let Some(dest) = self.route.dest {
                self.txq.write_bytes(dest.as_slice())?;
            }
        }
        Ok(())
    }

    /// `m2np_footer`: apply security, reserve the CRC, patch length and LC.
    pub fn footer<'s>(
        &mut self,
        security: Option<&mut (dyn SecurityPort + 's)>,
    ) -> Result<(), FrameError> {
        if let Some(key) = self.tx_key {
            let sec = security.ok_or(FrameError::NoSecurity)?;
            let region = self.txq.written_mut(self.tx_secure_start)?;
            if !sec.encrypt(key, region) {
                return Err(FrameError::SecurityFailed);
            }
        }
        self.txq.write_bytes(&[0; FOOTER_LEN])?;
        let len = self.txq.len() as u8;
        self.txq.set_byte(0, len)?;
        self.txq.set_byte(1, self.tx_lc)?;
        Ok(())
    }

    /// Parse an inbound frame sitting in `rxq` and route it.
    ///
    /// Negative return: drop, do not respond.
    pub fn route_ff(
        &mut self,
        session: &mut Session,
        m2qp: &mut Transport,
        comm: &mut Comm,
        netconf: &StackConfig,
        ports: &mut Ports<'_>,
    ) -> i16 {
        match self.parse_header(session, netconf, ports) {
            Ok(Inbound::Local) => m2qp.parse_frame(self, session, comm, netconf, ports),
            Ok(Inbound::Datastream) => m2qp.parse_dspkt(self, session),
            Ok(Inbound::Forward) => match ports.route.as_deref_mut() {
                Some(router) => router.network_sig_route(&self.route, self.rxq.unread()),
                None => {
                    debug!("m2np: frame for another node, no router installed");
                    -1
                }
            },
            Err(reason) => {
                warn!("m2np: dropped inbound frame ({:?})", reason);
                -1
            }
        }
    }

    fn parse_header(
        &mut self,
        session: &mut Session,
        netconf: &StackConfig,
        ports: &mut Ports<'_>,
    ) -> Result<Inbound, Reject> {
        let len = usize::from(self.rxq.byte_at(0).ok_or(Reject::Length)?);
        if len < MIN_HEADER + FOOTER_LEN || len > self.rxq.len() {
            return Err(Reject::Length);
        }
        self.rxq.truncate(len - FOOTER_LEN)?;
        self.rxq.set_get_cursor(0)?;
        self.rxq.skip(2)?;

        let subnet = self.rxq.read_byte()?;
        let fi_byte = self.rxq.read_byte()?;

        if fi_byte & fi::FRTYPE == fi::M2DP {
            let dialog_id = self.rxq.read_byte()?;
            if !session.is_connected() {
                return Err(Reject::Dialog);
            }
            self.check_dialog(session, subnet, dialog_id, netconf)?;
            return Ok(Inbound::Datastream);
        }

        let ext_byte = if fi_byte & fi::EXT != 0 {
            self.rxq.read_byte()?
        } else {
            0
        };
        if fi_byte & (fi::DLLS | fi::NLS) == fi::DLLS | fi::NLS {
            return Err(Reject::Security);
        }

        let dialog_id = self.rxq.read_byte()?;
        self.check_dialog(session, subnet, dialog_id, netconf)?;

        session.flags = 0;
        if fi_byte & fi::LISTEN != 0 {
            session.flags |= flags::LISTEN;
        }
        if fi_byte & fi::DLLS != 0 {
            session.flags |= flags::DLLS;
        }
        if fi_byte & fi::NLS != 0 {
            session.flags |= flags::NLS;
        }
        if fi_byte & fi::VID != 0 {
            session.flags |= flags::VID;
        }
        if ext_byte & ext::ROUTE != 0 {
            session.flags |= flags::ROUTE;
        }
        if ext_byte & ext::RSCODE != 0 {
            session.flags |= flags::RSCODE;
        }

        let mut key_index = None;
        if fi_byte & (fi::DLLS | fi::NLS) != 0 {
            let key = self.rxq.read_byte()?;
            let start = self.rxq.get_cursor();
            let sec = ports.security.as_deref_mut().ok_or(Reject::Security)?;
            let region = self.rxq.written_mut(start)?;
            if !sec.decrypt(key, region) {
                return Err(Reject::Security);
            }
            key_index = Some(key);
        }

        let id_len = if fi_byte & fi::VID != 0 { 2 } else { 8 };
        self.dlog_source = self.read_id(id_len)?;

        let addressing = Addressing::from_frame_info(fi_byte);
        if addressing == Addressing::Unicast {
            let target = self.read_id(id_len)?;
            if !idcmp(netconf, target.as_slice()) {
                return Err(Reject::Address);
            }
        }

        self.header = HeaderInfo {
            subnet,
            frame_info: fi_byte,
            ext: ext_byte,
            addressing,
            dialog_id,
            key_index,
        };

        self.route = RouteInfo::default();
        if ext_byte & ext::ROUTE != 0 {
            let hop_code = self.rxq.read_byte()?;
            let hop_ext = if hop_code & hop::EXT != 0 {
                self.rxq.read_byte()?
            } else {
                0
            };
            let origin = if hop_code & hop::ORIGIN != 0 {
                Some(self.read_id(id_len)?)
            } else {
                None
            };
            let dest = if hop_code & hop::DEST != 0 {
                Some(self.read_id(id_len)?)
            } else {
                None
            };
            self.route = RouteInfo {
                hop_code,
                hop_ext,
                origin,
                dest,
            };
            if netconf.multihop {
                if let Some(dest) = dest {
                    if !idcmp(netconf, dest.as_slice()) {
                        return Ok(Inbound::Forward);
                    }
                }
            }
        }
        Ok(Inbound::Local)
    }

    /// First frame of a dialog connects and captures subnet + ID; later
    /// frames must carry exactly the next ID.
    fn check_dialog(
        &mut self,
        session: &mut Session,
        subnet: u8,
        dialog_id: u8,
        netconf: &StackConfig,
    ) -> Result<(), Reject> {
        if session.is_connected() {
            if dialog_id != session.dialog_id.wrapping_add(1) {
                return Err(Reject::Dialog);
            }
        } else {
            if !subnet_matches(subnet, netconf.subnet) {
                return Err(Reject::Subnet);
            }
            session.netstate.insert(NetState::CONNECTED);
            session.subnet = subnet;
        }
        session.dialog_id = dialog_id;
        Ok(())
    }

    fn read_id(&mut self, len: usize) -> Result<DeviceId, Reject> {
        let bytes = self.rxq.read_bytes(len)?;
        DeviceId::from_slice(bytes).ok_or(Reject::Truncated)
    }
}
