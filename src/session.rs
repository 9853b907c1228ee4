//! Session manager.
//!
//! An ordered, fixed-capacity collection of dialogs.  The session with
//! the smallest `counter` (ticks until it is due) is the "top" and is the
//! only one the DLL task processes.  Overflow rejects the newest request
//! and never disturbs the sessions already scheduled.
//!
//! The DLL wraps the stack in a critical-section mutex; this type itself
//! is plain data so it can be unit tested directly.

use heapless::Vec;
use log::{debug, warn};

use crate::dll::Dll;
use crate::error::SessionError;
use crate::ports::Ports;
use crate::time::Ti;

/// Maximum number of scheduled sessions.
pub const SESSION_CAPACITY: usize = 4;

/// Called once when a session is activated; may rewrite any field.
pub type Applet = fn(&mut Dll, &mut Session, &mut Ports<'_>);

// ---------------------------------------------------------------------------
// Netstate
// ---------------------------------------------------------------------------

/// Direction/phase of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substate {
    ReqTx,
    ReqRx,
    RespTx,
    RespRx,
}

/// Session netstate bitmask: a 2-bit substate plus orthogonal flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetState(pub u8);

impl NetState {
    pub const REQTX: u8 = 0x00;
    pub const REQRX: u8 = 0x01;
    pub const RESPTX: u8 = 0x02;
    pub const RESPRX: u8 = 0x03;
    pub const TMASK: u8 = 0x03;
    pub const FLOOD: u8 = 0x04;
    /// Not yet activated; the applet has not run.
    pub const INIT: u8 = 0x08;
    pub const CONNECTED: u8 = 0x10;
    pub const LISTEN: u8 = 0x20;
    pub const DSDIALOG: u8 = 0x40;
    pub const SCRAP: u8 = 0x80;

    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn substate(self) -> Substate {
        match self.0 & Self::TMASK {
            Self::REQTX => Substate::ReqTx,
            Self::REQRX => Substate::ReqRx,
            Self::RESPTX => Substate::RespTx,
            _ => Substate::RespRx,
        }
    }

    pub fn set_substate(&mut self, sub: Substate) {
        let bits = match sub {
            Substate::ReqTx => Self::REQTX,
            Substate::ReqRx => Self::REQRX,
            Substate::RespTx => Self::RESPTX,
            Substate::RespRx => Self::RESPRX,
        };
        self.0 = (self.0 & !Self::TMASK) | bits;
    }

    pub const fn contains(self, bits: u8) -> bool {
        self.0 & bits == bits
    }

    pub fn insert(&mut self, bits: u8) {
        self.0 |= bits;
    }

    pub fn remove(&mut self, bits: u8) {
        self.0 &= !bits;
    }
}

/// Per-dialog option flags.
pub mod flags {
    /// Keep listening after the response (listen-continuation).
    pub const LISTEN: u8 = 0x80;
    pub const DLLS: u8 = 0x40;
    pub const NLS: u8 = 0x20;
    /// Device IDs in this dialog are 2-byte VIDs.
    pub const VID: u8 = 0x10;
    /// Multi-hop routing block present.
    pub const ROUTE: u8 = 0x02;
    /// Block (RS) coding active.
    pub const RSCODE: u8 = 0x01;
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Session {
    /// Ticks until this session is due.
    pub counter: Ti,
    pub channel: u8,
    pub netstate: NetState,
    pub flags: u8,
    pub dialog_id: u8,
    pub subnet: u8,
    /// Applet-specific scratch.
    pub extra: u8,
    pub applet: Option<Applet>,
}

impl Session {
    pub fn is_scrap(&self) -> bool {
        self.netstate.contains(NetState::SCRAP)
    }

    pub fn is_connected(&self) -> bool {
        self.netstate.contains(NetState::CONNECTED)
    }

    /// Mark for immediate removal.
    pub fn scrap(&mut self) {
        self.netstate.insert(NetState::SCRAP);
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// Priority-ordered session collection; index 0 is the top.
#[derive(Default)]
pub struct SessionStack {
    heap: Vec<Session, SESSION_CAPACITY>,
    next_dialog: u8,
}

impl SessionStack {
    pub const fn new() -> Self {
        Self {
            heap: Vec::new(),
            next_dialog: 0,
        }
    }

    /// Schedule a new session `wait` ticks from now.
    pub fn session_new(
        &mut self,
        applet: Option<Applet>,
        wait: Ti,
        subnet: u8,
        channel: u8,
        netstate: NetState,
    ) -> Result<&mut Session, SessionError> {
        let dialog_id = self.next_dialog;
        let idx = self.insert(Session {
            counter: wait,
            channel,
            netstate,
            flags: 0,
            dialog_id,
            subnet,
            extra: 0,
            applet,
        })?;
        self.next_dialog = self.next_dialog.wrapping_add(1);
        self.heap.get_mut(idx).ok_or(SessionError::Empty)
    }

    /// Schedule a copy of `src` with a new wait and netstate.
    pub fn session_clone(
        &mut self,
        src: &Session,
        wait: Ti,
        netstate: NetState,
    ) -> Result<&mut Session, SessionError> {
        let mut copy = *src;
        copy.counter = wait;
        copy.netstate = netstate;
        copy.applet = None;
        let idx = self.insert(copy)?;
        self.heap.get_mut(idx).ok_or(SessionError::Empty)
    }

    fn insert(&mut self, session: Session) -> Result<usize, SessionError> {
        if self.heap.is_full() {
            warn!("session: stack full, rejecting new session on ch {}", session.channel);
            return Err(SessionError::Full);
        }
        let idx = self
            .heap
            .iter()
            .position(|s| s.counter > session.counter)
            .unwrap_or(self.heap.len());
        self.heap
            .insert(idx, session)
            .map_err(|_| SessionError::Full)?;
        debug!("session: scheduled at slot {} (wait {} ti)", idx, session.counter.0);
        Ok(idx)
    }

    pub fn session_top(&self) -> Option<&Session> {
        self.heap.first()
    }

    pub fn session_top_mut(&mut self) -> Option<&mut Session> {
        self.heap.first_mut()
    }

    pub fn session_pop(&mut self) -> Option<Session> {
        if self.heap.is_empty() {
            None
        } else {
            Some(self.heap.remove(0))
        }
    }

    pub fn session_follower(&self) -> Option<&Session> {
        self.heap.get(1)
    }

    /// Ticks until the session after the top is due, or `Ti::NEVER`.
    pub fn session_follower_wait(&self) -> Ti {
        self.session_follower().map_or(Ti::NEVER, |s| s.counter)
    }

    pub fn session_notempty(&self) -> bool {
        !self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Age every session by `elapsed`.  Ordering is preserved because all
    /// counters shrink by the same amount and saturate together at zero.
    pub fn session_refresh(&mut self, elapsed: Ti) {
        for s in &mut self.heap {
            s.counter = s.counter.saturating_sub(elapsed);
        }
    }

    /// Drop every session.
    pub fn flush(&mut self) {
        self.heap.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.heap.iter()
    }
}
