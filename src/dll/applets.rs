//! Built-in session applets.
//!
//! An applet runs once, when its session reaches the top of the stack
//! with a zero counter.  It decides the session's direction and loads
//! `dll.comm` (and, for requests, stages the frame in `m2np.txq`).

use log::{info, warn};

use super::Dll;
use crate::error::{self, QueueError, SessionError, VlError};
use crate::m2np::Addressing;
use crate::m2qp::isf::{IsfCall, isf_return};
use crate::m2qp::query::SCORE_FILE_ERROR;
use crate::m2qp::{Transport, cmd};
use crate::ports::{Ports, UserId};
use crate::session::{NetState, Session, Substate, flags};
use crate::time::Ti;

/// Used when a session has no applet: a TX session with nothing staged
/// has nothing to do.
pub fn default_applet(dll: &mut Dll, session: &mut Session, _ports: &mut Ports<'_>) {
    if session.netstate.substate() == Substate::ReqTx && dll.m2np.txq.is_empty() {
        session.scrap();
    }
}

/// Background scan: listen for requests on the configured channel.
pub fn scan_applet(dll: &mut Dll, session: &mut Session, _ports: &mut Ports<'_>) {
    let scan = dll.netconf.scan;
    session.netstate.set_substate(Substate::ReqRx);
    session.netstate.remove(NetState::CONNECTED);
    session.channel = scan.channel;
    dll.comm.rx_timeout = scan.timeout;
    dll.comm.redundants.set(scan.redundants);
    dll.comm.csmaca_params = dll.netconf.csma.params;
}

/// Broadcast an announcement of the beacon ISF, then schedule the next
/// beacon.
///
/// Frame body: NA2P announcement with NORESP, zero response window, the
/// ISF call template, then the ISF return itself.
pub fn beacon_applet(dll: &mut Dll, session: &mut Session, ports: &mut Ports<'_>) {
    let beacon = dll.netconf.beacon;

    if beacon.enabled {
        if let Err(e) = dll.session_new(
            Some(beacon_applet),
            beacon.interval,
            dll.netconf.beacon_subnet,
            beacon.channel,
            NetState::new(NetState::REQTX | NetState::INIT),
        ) {
            warn!("beacon: cannot reschedule: {}", e);
        }
    }

    session.netstate.set_substate(Substate::ReqTx);
    session.netstate.remove(NetState::CONNECTED);
    session.subnet = dll.netconf.beacon_subnet;
    session.channel = beacon.channel;
    session.flags = if dll.netconf.vid_assigned() { flags::VID } else { 0 };

    if let Err(e) = stage_beacon(dll, session, ports) {
        warn!("beacon: isf {:#04x} not staged: {}", beacon.isf_id, e);
        dll.m2np.txq.empty();
        session.scrap();
        return;
    }

    dll.comm.redundants.set(beacon.redundants);
    dll.comm.tc = beacon.window.to_clk();
    dll.comm.rx_timeout = Ti::ZERO;
    dll.comm.csmaca_params = dll.netconf.csma.params;
    dll.comm.set_tx_channel(beacon.channel);
    info!(
        "beacon: isf {:#04x} on ch {:#04x} ({} bytes)",
        beacon.isf_id,
        beacon.channel,
        dll.m2np.txq.len()
    );
}

fn stage_beacon(dll: &mut Dll, session: &mut Session, ports: &mut Ports<'_>) -> error::Result<()> {
    let beacon = dll.netconf.beacon;
    let call = IsfCall::file(beacon.isf_id, beacon.max_bytes);

    dll.m2np
        .header(session, Addressing::Broadcast, false, &dll.netconf)?;
    let ext = cmd::EXT_NORESP | (dll.netconf.csma.params & cmd::EXT_CSMA);
    let txq = &mut dll.m2np.txq;
    Transport::write_request(txq, cmd::TYPE_NA2P | cmd::OP_ANNOUNCE_FILE, Some(ext), 0)?;
    txq.write_bytes(&[call.max_bytes, beacon.isf_id, 0])?;
    match isf_return(&call, txq, UserId::Guest, ports.fs, ports.auth) {
        SCORE_FILE_ERROR => return Err(VlError::NotFound.into()),
        n if n < 0 => return Err(QueueError::Full.into()),
        _ => {}
    }
    dll.m2np.footer(ports.security.as_deref_mut())?;
    Ok(())
}

impl Dll {
    /// Queue a background scan `wait` ticks from now.
    pub fn schedule_scan(&self, wait: Ti) -> Result<(), SessionError> {
        let scan = self.netconf.scan;
        self.session_new(
            Some(scan_applet),
            wait,
            self.netconf.subnet,
            scan.channel,
            NetState::new(NetState::REQRX | NetState::INIT),
        )
    }

    /// Queue the first beacon `wait` ticks from now.  It re-arms itself
    /// while beaconing stays enabled.
    pub fn schedule_beacon(&self, wait: Ti) -> Result<(), SessionError> {
        self.session_new(
            Some(beacon_applet),
            wait,
            self.netconf.beacon_subnet,
            self.netconf.beacon.channel,
            NetState::new(NetState::REQTX | NetState::INIT),
        )
    }
}
