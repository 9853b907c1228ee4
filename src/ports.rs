//! Port traits: the boundary between the Mode-2 engine and its collaborators.
//!
//! ```text
//!   Radio driver ──▶ RadioPort ◀── Dll
//!   Veelite      ──▶ FilePort  ◀── M2QP
//!   auth / crypto / routing / UDP applications ──▶ narrow traits
//! ```
//!
//! The engine never touches hardware, storage or keys directly.  A board
//! wires concrete adapters into a [`Ports`] bundle and passes it to the
//! DLL task on every call.

use rand_core::RngCore;

use crate::error::{RadioError, VlError};
use crate::m2np::{DeviceId, RouteInfo};
use crate::time::Ti;

// ───────────────────────────────────────────────────────────────
// Radio (driven adapter: engine → driver)
// ───────────────────────────────────────────────────────────────

/// Entry points of the radio driver.  Completion is reported back through
/// the `Dll::rfevt_*` callbacks or the [`RADIO_EVENTS`](crate::dll::events::RADIO_EVENTS)
/// channel.
pub trait RadioPort {
    /// Start listening on `channel`; the driver reports a frame or times out.
    fn rx_init(&mut self, channel: u8, timeout: Ti) -> Result<(), RadioError>;

    /// Run a clear-channel assessment; result via `rfevt_txcsma`.
    fn cca(&mut self, channel: u8) -> Result<(), RadioError>;

    /// Transmit `frame` (CRC appended by the driver); result via `rfevt_ftx`.
    fn tx_init(&mut self, channel: u8, frame: &[u8]) -> Result<(), RadioError>;

    /// Power down to idle.
    fn idle(&mut self);
}

// ───────────────────────────────────────────────────────────────
// File system (Veelite)
// ───────────────────────────────────────────────────────────────

/// Opaque handle returned by [`FilePort::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle(pub u8);

/// Requested access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    /// Guest-position rwx bits for this access.
    pub const fn req_mod(self) -> u8 {
        match self {
            Self::Read => ACCESS_READ,
            Self::Write => ACCESS_WRITE,
        }
    }
}

pub const ACCESS_READ: u8 = 0x04;
pub const ACCESS_WRITE: u8 = 0x02;

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserId {
    Root,
    User,
    Guest,
}

/// Key/offset/length store backing queryable data elements.
///
/// `read`/`write` move 16-bit words at even offsets; the low byte sits at
/// the even address.
pub trait FilePort {
    fn open(&mut self, id: u8, access: Access, user: UserId) -> Result<FileHandle, VlError>;
    fn length(&self, fp: FileHandle) -> u16;
    /// Veelite access modifier byte of the open file.
    fn modifiers(&self, fp: FileHandle) -> u8;
    fn read(&self, fp: FileHandle, offset: u16) -> Result<u16, VlError>;
    fn write(&mut self, fp: FileHandle, offset: u16, word: u16) -> Result<(), VlError>;
    fn close(&mut self, fp: FileHandle);
}

/// Byte read on top of the word interface.
pub fn read_byte(fs: &dyn FilePort, fp: FileHandle, offset: u16) -> Result<u8, VlError> {
    let word = fs.read(fp, offset & !1)?;
    let [lo, hi] = word.to_le_bytes();
    Ok(if offset & 1 == 0 { lo } else { hi })
}

// ───────────────────────────────────────────────────────────────
// Authentication
// ───────────────────────────────────────────────────────────────

pub trait AuthPort {
    fn auth_check(&self, data_mod: u8, req_mod: u8, user: UserId) -> bool;
}

/// Veelite modifier semantics: root always passes, user rights sit three
/// bits above guest rights.
pub fn auth_check(data_mod: u8, req_mod: u8, user: UserId) -> bool {
    let req = req_mod & 0x07;
    match user {
        UserId::Root => true,
        UserId::User => data_mod & (req << 3) == req << 3,
        UserId::Guest => data_mod & req == req,
    }
}

/// [`AuthPort`] backed by [`auth_check`].
pub struct StandardAuth;

impl AuthPort for StandardAuth {
    fn auth_check(&self, data_mod: u8, req_mod: u8, user: UserId) -> bool {
        auth_check(data_mod, req_mod, user)
    }
}

// ───────────────────────────────────────────────────────────────
// Optional collaborators
// ───────────────────────────────────────────────────────────────

/// Payload transform for DLLS/NLS frames.  Length-preserving, in place.
pub trait SecurityPort {
    fn encrypt(&mut self, key_index: u8, data: &mut [u8]) -> bool;
    fn decrypt(&mut self, key_index: u8, data: &mut [u8]) -> bool;
}

/// Multi-hop forwarding decision (`network_sig_route`).
pub trait RoutePort {
    /// Called for frames whose routing block names another destination.
    /// Returns a score; negative drops the frame.
    fn network_sig_route(&mut self, route: &RouteInfo, payload: &[u8]) -> i16;
}

/// Receiver of inventory+UDP payloads.
pub trait UdpPort {
    /// Returns `false` if no application is bound to `dst_port`.
    fn udp_receive(&mut self, source: &DeviceId, src_port: u8, dst_port: u8, data: &[u8]) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Bundle
// ───────────────────────────────────────────────────────────────

static STANDARD_AUTH: StandardAuth = StandardAuth;

/// Everything the engine needs from the outside world for one call.
pub struct Ports<'a> {
    pub radio: &'a mut dyn RadioPort,
    pub fs: &'a mut dyn FilePort,
    pub auth: &'a dyn AuthPort,
    pub rng: &'a mut dyn RngCore,
    pub security: Option<&'a mut dyn SecurityPort>,
    pub route: Option<&'a mut dyn RoutePort>,
    pub udp: Option<&'a mut dyn UdpPort>,
}

impl<'a> Ports<'a> {
    /// Bundle with [`StandardAuth`] and no optional collaborators.
    pub fn new(
        radio: &'a mut dyn RadioPort,
        fs: &'a mut dyn FilePort,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            radio,
            fs,
            auth: &STANDARD_AUTH,
            rng,
            security: None,
            route: None,
            udp: None,
        }
    }
}
