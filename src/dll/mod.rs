//! Data-link task and radio event dispatcher.
//!
//! ```text
//!            activate            fc_init              cca clear
//!   Idle ──────────────▶ (ReqTx) ─────────▶ CsmaWait ─────────▶ CcaPending ──▶ Tx
//!     ▲  ╲                                     ▲  busy: fc_loop      │            │
//!     │   ╲ (ReqRx)                            └─────────────────────┘            │
//!     │    ╲────────────▶ Rx ◀─────────────────────────── ReqTx + response window ┘
//!     │                   │ frame: route_ff ─▶ response staged ─▶ CsmaWait
//!     └── pop ◀───────────┘ timeout / drop / done
//! ```
//!
//! Only the top session of the [`SessionStack`] is ever processed.  The
//! session collection and the `redundants` counter are the only state the
//! radio interrupt can race on, so they alone sit behind critical-section
//! locks; the rest of the pipeline runs lock-free in the DLL task.

pub mod applets;
pub mod events;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info, warn};

use crate::config::StackConfig;
use crate::csma::{Comm, CsmaAlgorithm, params};
use crate::error::SessionError;
use crate::m2np::Network;
use crate::m2qp::Transport;
use crate::ports::Ports;
use crate::session::{Applet, NetState, Session, SessionStack, Substate, flags};
use crate::time::{Clk, Ti, frame_duration};

use self::events::{RADIO_EVENTS, RadioEvent};

/// Slack added to the RX watchdog beyond the driver's own timeout.
const RX_GUARD: Ti = Ti(16);

/// What the DLL is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DllState {
    /// No session active.
    Idle,
    /// Counting down a CSMA offset.
    CsmaWait,
    /// Waiting for `rfevt_txcsma`.
    CcaPending,
    /// Waiting for `rfevt_ftx`.
    Tx,
    /// Waiting for `rfevt_frx` or `rfevt_rxtimeout`.
    Rx,
}

pub struct Dll {
    pub comm: Comm,
    pub netconf: StackConfig,
    pub m2np: Network,
    pub m2qp: Transport,
    sessions: Mutex<CriticalSectionRawMutex, RefCell<SessionStack>>,
    state: DllState,
    countdown: Ti,
}

impl Dll {
    pub fn new(netconf: StackConfig) -> Self {
        Self {
            comm: Comm::new(netconf.csma.tg.to_clk()),
            netconf,
            m2np: Network::new(),
            m2qp: Transport::new(),
            sessions: Mutex::new(RefCell::new(SessionStack::new())),
            state: DllState::Idle,
            countdown: Ti::ZERO,
        }
    }

    pub fn state(&self) -> DllState {
        self.state
    }

    /// Run `f` with the session collection locked.
    pub fn sessions<R>(&self, f: impl FnOnce(&mut SessionStack) -> R) -> R {
        self.sessions.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Schedule a session `wait` ticks from now.
    pub fn session_new(
        &self,
        applet: Option<Applet>,
        wait: Ti,
        subnet: u8,
        channel: u8,
        netstate: NetState,
    ) -> Result<(), SessionError> {
        self.sessions(|st| {
            st.session_new(applet, wait, subnet, channel, netstate)
                .map(|_| ())
        })
    }

    /// Drop every session and go idle.
    pub fn flush(&mut self, ports: &mut Ports<'_>) {
        self.sessions(SessionStack::flush);
        ports.radio.idle();
        self.state = DllState::Idle;
        self.countdown = Ti::ZERO;
    }

    fn top(&self) -> Option<Session> {
        self.sessions(|st| st.session_top().copied())
    }

    fn store_top(&self, session: Session) {
        self.sessions(|st| {
            if let Some(top) = st.session_top_mut() {
                *top = session;
            }
        });
    }

    fn pop_session(&mut self, ports: &mut Ports<'_>) {
        if let Some(s) = self.sessions(SessionStack::session_pop) {
            debug!(
                "dll: session done (ch {:#04x}, netstate {:#04x})",
                s.channel, s.netstate.0
            );
        }
        ports.radio.idle();
        self.state = DllState::Idle;
        self.countdown = Ti::ZERO;
    }

    // ── Task ─────────────────────────────────────────────────

    /// Advance the DLL by `elapsed` ticks.  Returns the ticks until it
    /// next needs to run ([`Ti::NEVER`] if it only waits on radio events).
    pub fn systask(&mut self, elapsed: Ti, ports: &mut Ports<'_>) -> Ti {
        self.sessions(|st| st.session_refresh(elapsed));

        match self.state {
            DllState::Idle => self.activate(ports),
            DllState::CsmaWait => {
                self.countdown = self.countdown.saturating_sub(elapsed);
                if self.countdown.is_zero() {
                    self.csma_attempt(ports);
                }
            }
            DllState::Rx => {
                self.countdown = self.countdown.saturating_sub(elapsed);
                if self.countdown.is_zero() {
                    warn!("dll: rx watchdog expired");
                    ports.radio.idle();
                    self.rfevt_rxtimeout(ports);
                }
            }
            DllState::CcaPending | DllState::Tx => {}
        }
        self.next_wakeup()
    }

    pub fn next_wakeup(&self) -> Ti {
        match self.state {
            DllState::Idle => self.sessions(|st| st.session_top().map_or(Ti::NEVER, |s| s.counter)),
            DllState::CsmaWait | DllState::Rx => self.countdown,
            DllState::CcaPending | DllState::Tx => Ti::NEVER,
        }
    }

    /// Drain [`RADIO_EVENTS`] and dispatch each event.
    pub fn poll_radio_events(&mut self, ports: &mut Ports<'_>) -> usize {
        let mut handled = 0;
        while let Ok(event) = RADIO_EVENTS.try_receive() {
            match event {
                RadioEvent::RxDone { frame, crc_ok } => self.rfevt_frx(&frame, crc_ok, ports),
                RadioEvent::RxTimeout => self.rfevt_rxtimeout(ports),
                RadioEvent::CcaResult(clear) => self.rfevt_txcsma(clear, ports),
                RadioEvent::TxDone(ok) => self.rfevt_ftx(ok, ports),
            }
            handled += 1;
        }
        handled
    }

    fn activate(&mut self, ports: &mut Ports<'_>) {
        let Some(mut s) = self.top().filter(|s| s.counter.is_zero()) else {
            return;
        };
        s.netstate.remove(NetState::INIT);
        // Each request picks its own channels; the session's is the fallback.
        self.comm.tx_channels.clear();
        self.comm.csmaca_params = self.netconf.csma.params;
        let applet = s.applet.take().unwrap_or(applets::default_applet);
        applet(self, &mut s, ports);

        if s.is_scrap() {
            debug!("dll: applet scrapped session");
            self.pop_session(ports);
            return;
        }
        self.store_top(s);

        match s.netstate.substate() {
            Substate::ReqTx => self.start_tx(&s, ports),
            Substate::ReqRx => {
                let timeout = self.listen_window();
                self.start_rx(s.channel, timeout, ports);
            }
            Substate::RespTx | Substate::RespRx => {
                warn!("dll: session activated in response state");
                self.pop_session(ports);
            }
        }
    }

    /// RX window for a listening session: the applet's, else the scan default.
    fn listen_window(&self) -> Ti {
        if self.comm.rx_timeout.is_zero() {
            self.netconf.scan.timeout
        } else {
            self.comm.rx_timeout
        }
    }

    fn start_tx(&mut self, s: &Session, ports: &mut Ports<'_>) {
        if self.m2np.txq.is_empty() {
            self.pop_session(ports);
            return;
        }
        if self.comm.tx_channels.is_empty() {
            self.comm.set_tx_channel(s.channel);
        }
        let channel = self.comm.tx_channel().unwrap_or(s.channel);
        let duration = frame_duration(self.m2np.txq.len(), channel);
        let offset = self.comm.fc_init(&mut *ports.rng, duration);
        info!(
            "dll: tx {} bytes on ch {:#04x}, csma offset {} clk",
            self.m2np.txq.len(),
            channel,
            offset.0
        );
        self.enter_csma_wait(offset, ports);
    }

    fn start_rx(&mut self, channel: u8, timeout: Ti, ports: &mut Ports<'_>) {
        match ports.radio.rx_init(channel, timeout) {
            Ok(()) => {
                self.state = DllState::Rx;
                self.countdown = timeout + RX_GUARD;
            }
            Err(e) => {
                warn!("dll: rx_init on ch {:#04x} failed: {}", channel, e);
                self.pop_session(ports);
            }
        }
    }

    fn enter_csma_wait(&mut self, offset: Clk, ports: &mut Ports<'_>) {
        self.state = DllState::CsmaWait;
        self.countdown = offset.to_ti();
        if self.countdown.is_zero() {
            self.csma_attempt(ports);
        }
    }

    fn csma_attempt(&mut self, ports: &mut Ports<'_>) {
        let Some(channel) = self.comm.tx_channel() else {
            self.pop_session(ports);
            return;
        };
        if self.comm.algorithm() == CsmaAlgorithm::NoCa {
            self.transmit(channel, ports);
            return;
        }
        match ports.radio.cca(channel) {
            Ok(()) => self.state = DllState::CcaPending,
            Err(e) => {
                debug!("dll: cca on ch {:#04x} failed: {}", channel, e);
                self.csma_busy(ports);
            }
        }
    }

    fn transmit(&mut self, channel: u8, ports: &mut Ports<'_>) {
        match ports.radio.tx_init(channel, self.m2np.txq.as_slice()) {
            Ok(()) => self.state = DllState::Tx,
            Err(e) => {
                warn!("dll: tx_init on ch {:#04x} failed: {}", channel, e);
                self.tx_failed(ports);
            }
        }
    }

    fn csma_busy(&mut self, ports: &mut Ports<'_>) {
        if let Some(offset) = self.comm.fc_loop(&mut *ports.rng) {
            self.comm.next_tx_channel();
            self.enter_csma_wait(offset, ports);
        } else if self.comm.redundants.take_one() {
            let duration = self.comm.frame_duration;
            let offset = self.comm.fc_init(&mut *ports.rng, duration);
            self.enter_csma_wait(offset, ports);
        } else {
            info!("dll: contention window exhausted, giving up");
            self.pop_session(ports);
        }
    }

    fn tx_failed(&mut self, ports: &mut Ports<'_>) {
        if self.comm.redundants.take_one() {
            let guard = self.comm.tg;
            self.enter_csma_wait(guard, ports);
        } else {
            self.pop_session(ports);
        }
    }

    // ── Radio callbacks ──────────────────────────────────────

    /// Frame received.  `frame` includes the length byte and CRC trailer.
    pub fn rfevt_frx(&mut self, frame: &[u8], crc_ok: bool, ports: &mut Ports<'_>) {
        if self.state != DllState::Rx {
            debug!("dll: stray rx event in {:?}", self.state);
            return;
        }
        let Some(mut s) = self.top() else {
            self.state = DllState::Idle;
            return;
        };

        if !crc_ok {
            debug!("dll: crc error on ch {:#04x}", s.channel);
            if s.netstate.substate() == Substate::ReqRx && self.comm.redundants.take_one() {
                let timeout = self.listen_window();
                self.start_rx(s.channel, timeout, ports);
            } else {
                self.pop_session(ports);
            }
            return;
        }

        if self.m2np.rxq.load(frame).is_err() {
            self.pop_session(ports);
            return;
        }
        let score = self
            .m2np
            .route_ff(&mut s, &mut self.m2qp, &mut self.comm, &self.netconf, ports);
        if score < 0 || s.is_scrap() {
            self.pop_session(ports);
            return;
        }

        match s.netstate.substate() {
            Substate::RespTx => {
                self.store_top(s);
                self.stage_response(&s, ports);
            }
            Substate::RespRx if s.netstate.contains(NetState::LISTEN) => {
                let remaining = self.countdown.saturating_sub(RX_GUARD);
                if remaining.is_zero() {
                    self.pop_session(ports);
                    return;
                }
                // Every responder answers the same request ID.
                s.dialog_id = s.dialog_id.wrapping_sub(1);
                self.store_top(s);
                self.start_rx(s.channel, remaining, ports);
            }
            Substate::ReqRx if s.netstate.contains(NetState::DSDIALOG) => {
                self.store_top(s);
                let timeout = self.listen_window();
                self.start_rx(s.channel, timeout, ports);
            }
            _ => self.pop_session(ports),
        }
    }

    /// The transport staged a response in `m2np.txq`.
    fn stage_response(&mut self, s: &Session, ports: &mut Ports<'_>) {
        let follower = self.sessions(|st| st.session_follower_wait());
        if follower != Ti::NEVER && self.comm.tc > follower.to_clk() {
            self.comm.tc = follower.to_clk();
        }
        self.comm.redundants.set(0);

        if s.flags & flags::LISTEN != 0 {
            let netstate = NetState::new(
                (s.netstate.0 & (NetState::CONNECTED | NetState::DSDIALOG)) | NetState::REQRX,
            );
            let wait = self.comm.tc.to_ti();
            if let Err(e) = self.sessions(|st| st.session_clone(s, wait, netstate).map(|_| ())) {
                warn!("dll: cannot schedule listen window: {}", e);
            }
            self.comm.rx_timeout = self.netconf.scan.timeout;
        }
        self.start_tx(s, ports);
    }

    /// RX window closed without a frame.
    pub fn rfevt_rxtimeout(&mut self, ports: &mut Ports<'_>) {
        if self.state != DllState::Rx {
            return;
        }
        let Some(mut s) = self.top() else {
            self.state = DllState::Idle;
            return;
        };
        if s.netstate.substate() == Substate::ReqRx && self.comm.redundants.take_one() {
            debug!("dll: rx timeout, restarting listen");
            s.netstate.remove(NetState::CONNECTED);
            self.store_top(s);
            let timeout = self.listen_window();
            self.start_rx(s.channel, timeout, ports);
        } else {
            self.pop_session(ports);
        }
    }

    /// CCA finished.
    pub fn rfevt_txcsma(&mut self, clear: bool, ports: &mut Ports<'_>) {
        if self.state != DllState::CcaPending {
            return;
        }
        match self.comm.tx_channel() {
            Some(channel) if clear => self.transmit(channel, ports),
            _ => self.csma_busy(ports),
        }
    }

    /// Transmission finished.
    pub fn rfevt_ftx(&mut self, ok: bool, ports: &mut Ports<'_>) {
        if self.state != DllState::Tx {
            return;
        }
        if !ok {
            self.tx_failed(ports);
            return;
        }
        let Some(mut s) = self.top() else {
            self.state = DllState::Idle;
            return;
        };

        match s.netstate.substate() {
            Substate::ReqTx => {
                if self.comm.redundants.take_one() {
                    let guard = self.comm.tg;
                    self.enter_csma_wait(guard, ports);
                } else if !self.comm.rx_timeout.is_zero() && !s.is_scrap() {
                    s.netstate.set_substate(Substate::RespRx);
                    if self.comm.csmaca_params & params::A2P != 0 {
                        s.netstate.insert(NetState::LISTEN);
                    }
                    self.store_top(s);
                    let timeout = self.comm.rx_timeout;
                    self.start_rx(s.channel, timeout, ports);
                } else {
                    self.pop_session(ports);
                }
            }
            Substate::RespTx | Substate::ReqRx | Substate::RespRx => self.pop_session(ports),
        }
    }
}
