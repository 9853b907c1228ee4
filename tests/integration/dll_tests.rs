//! End-to-end dialogs through the DLL task against the mock radio.

use dash7_m2::StackConfig;
use dash7_m2::csma::params;
use dash7_m2::dll::events::{self, RadioEvent};
use dash7_m2::dll::{Dll, DllState};
use dash7_m2::m2np::Addressing;
use dash7_m2::m2qp::{Transport, cmd};
use dash7_m2::ports::Ports;
use dash7_m2::queue::FrameQueue;
use dash7_m2::session::{NetState, Session, Substate, flags};
use dash7_m2::time::Ti;

use crate::mock_hw::{
    Bench, FI_BROADCAST, FI_VID, MemFs, MockUdp, RadioCall, broadcast_request, frame, m2dp_frame,
};

fn netconf() -> StackConfig {
    let mut c = StackConfig::default();
    c.device.vid = [0x12, 0x34];
    c
}

fn scanning(fs: MemFs) -> (Dll, Bench) {
    let mut dll = Dll::new(netconf());
    let mut bench = Bench::new(fs);
    dll.schedule_scan(Ti(0)).unwrap();
    dll.systask(Ti(0), &mut bench.ports());
    (dll, bench)
}

fn sample_fs() -> MemFs {
    MemFs::new().with_file(1, &[0xDE, 0xAD, 0xBE, 0xEF, 0x01])
}

#[test]
fn scan_starts_listening_on_scan_channel() {
    let (dll, bench) = scanning(sample_fs());
    assert_eq!(dll.state(), DllState::Rx);
    assert_eq!(
        bench.radio.calls,
        vec![RadioCall::RxInit {
            channel: 0x10,
            timeout: Ti(128)
        }]
    );
}

#[test]
fn announcement_request_gets_isf_response() {
    let (mut dll, mut bench) = scanning(sample_fs());
    let req = broadcast_request(5, &[cmd::TYPE_NA2P | cmd::OP_ANNOUNCE_FILE, 0x00, 4, 1, 0]);

    dll.rfevt_frx(&req, true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::CcaPending);
    assert_eq!(bench.radio.last_call(), Some(&RadioCall::Cca { channel: 0x10 }));

    dll.rfevt_txcsma(true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Tx);

    let sent = bench.radio.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0],
        &[
            20, 0x7F, 0xF0, 0x10, 6, 0x12, 0x34, 0xAA, 0xBB, // header, dialog 5 + 1
            0x00, // response to opcode 0
            1, 0x00, 0x05, 0x00, // isf 1, length 5, offset 0
            0xDE, 0xAD, 0xBE, 0xEF, // clamped to max-bytes 4
            0, 0,
        ]
    );

    dll.rfevt_ftx(true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert_eq!(dll.sessions(|st| st.len()), 0);
    assert_eq!(bench.fs.open_count, bench.fs.close_count);
}

#[test]
fn noresp_request_is_scrapped_without_transmitting() {
    let (mut dll, mut bench) = scanning(sample_fs());
    let req = broadcast_request(
        5,
        &[cmd::EXT | cmd::TYPE_NA2P, cmd::EXT_NORESP, 0x00, 4, 1, 0],
    );
    dll.rfevt_frx(&req, true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert!(bench.radio.sent().is_empty());
    assert_eq!(bench.radio.last_call(), Some(&RadioCall::Idle));
}

fn collection(kind: u8, file_value: [u8; 2]) -> Vec<u8> {
    let query = [2, 0x21, file_value[0], file_value[1], 3, 0];
    let mut payload = vec![kind | cmd::OP_COLLECT_FILE, 0x00];
    payload.extend_from_slice(&query); // local
    payload.extend_from_slice(&query); // global
    payload.extend_from_slice(&[2, 3, 0]); // call
    broadcast_request(9, &payload)
}

#[test]
fn a2p_collection_responds_only_when_query_matches() {
    let fs = MemFs::new().with_file(3, &[0x00, 0x2A]);
    let (mut dll, mut bench) = scanning(fs);
    dll.rfevt_frx(&collection(cmd::TYPE_A2P_INITIAL, [0x00, 0x2A]), true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::CcaPending);

    let fs = MemFs::new().with_file(3, &[0x00, 0x2B]);
    let (mut dll, mut bench) = scanning(fs);
    dll.rfevt_frx(&collection(cmd::TYPE_A2P_INITIAL, [0x00, 0x2A]), true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert!(bench.radio.sent().is_empty());
}

#[test]
fn a2p_subsequent_request_skips_acknowledged_device() {
    let (mut dll, mut bench) = scanning(MemFs::new().with_file(3, &[0x00, 0x2A]));
    let mut payload = vec![cmd::TYPE_A2P_SUBSEQUENT | cmd::OP_COLLECT_FILE, 0x00];
    payload.extend_from_slice(&[1, 0x12, 0x34]); // ack list holds our VID
    payload.extend_from_slice(&[2, 0x21, 0x00, 0x2A, 3, 0]);
    payload.extend_from_slice(&[2, 3, 0]);
    dll.rfevt_frx(&broadcast_request(9, &payload), true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert!(bench.radio.sent().is_empty());
}

#[test]
fn busy_channel_with_exhausted_window_drops_response() {
    let (mut dll, mut bench) = scanning(sample_fs());
    let req = broadcast_request(5, &[cmd::TYPE_NA2P, 0x00, 4, 1, 0]);
    dll.rfevt_frx(&req, true, &mut bench.ports());
    dll.rfevt_txcsma(false, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert!(bench.radio.sent().is_empty());
}

#[test]
fn rx_timeout_relistens_while_redundants_remain() {
    let mut conf = netconf();
    conf.scan.redundants = 2;
    let mut dll = Dll::new(conf);
    let mut bench = Bench::new(sample_fs());
    dll.schedule_scan(Ti(0)).unwrap();
    dll.systask(Ti(0), &mut bench.ports());

    dll.rfevt_rxtimeout(&mut bench.ports());
    dll.rfevt_rxtimeout(&mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    dll.rfevt_rxtimeout(&mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert_eq!(
        bench.radio.count(|c| matches!(c, RadioCall::RxInit { .. })),
        3
    );
}

#[test]
fn crc_error_without_redundants_pops() {
    let (mut dll, mut bench) = scanning(sample_fs());
    dll.rfevt_frx(&[5, 0, 0, 0, 0], false, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert_eq!(dll.sessions(|st| st.len()), 0);
}

#[test]
fn stray_events_are_ignored() {
    let mut dll = Dll::new(netconf());
    let mut bench = Bench::new(sample_fs());
    dll.rfevt_ftx(true, &mut bench.ports());
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_rxtimeout(&mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert!(bench.radio.calls.is_empty());
}

#[test]
fn udp_payload_is_delivered() {
    let (mut dll, mut bench) = scanning(sample_fs());
    let mut udp = MockUdp::bound_to(7);
    let req = broadcast_request(
        5,
        &[
            cmd::EXT | cmd::TYPE_NA2P | cmd::OP_INVENTORY_UDP,
            cmd::EXT_NORESP,
            0x00,
            7,
            9,
            b'h',
            b'i',
        ],
    );
    let mut ports = bench.ports();
    ports.udp = Some(&mut udp);
    dll.rfevt_frx(&req, true, &mut ports);
    drop(ports);

    assert_eq!(udp.received.len(), 1);
    let (src, src_port, data) = &udp.received[0];
    assert_eq!(src.as_slice(), &[0xAA, 0xBB]);
    assert_eq!(*src_port, 9);
    assert_eq!(data, b"hi");
    assert_eq!(dll.state(), DllState::Idle);
}

#[test]
fn datastream_init_then_continuation_frames() {
    let (mut dll, mut bench) = scanning(sample_fs());
    let req = broadcast_request(5, &[cmd::TYPE_NA2P | cmd::OP_DATASTREAM_INIT, 0x00]);
    dll.rfevt_frx(&req, true, &mut bench.ports());
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());

    // The ack went out and a listen session is waiting.
    assert_eq!(bench.radio.sent().len(), 1);
    assert_eq!(dll.sessions(|st| st.len()), 1);
    dll.systask(Ti(0), &mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);

    // Request was dialog 5, the ack 6.
    dll.rfevt_frx(&m2dp_frame(7, b"abc"), true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    dll.rfevt_frx(&m2dp_frame(8, b"de"), true, &mut bench.ports());
    assert_eq!(dll.m2qp.take_datastream().as_slice(), b"abcde");

    // Out-of-order dialog ID ends the stream.
    dll.rfevt_frx(&m2dp_frame(8, b"x"), true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
}

#[test]
fn beacon_transmits_redundantly_and_reschedules() {
    let mut conf = netconf();
    conf.device.vid = [0, 0];
    conf.beacon.enabled = true;
    conf.beacon.max_bytes = 2;
    let mut dll = Dll::new(conf.clone());
    let mut bench = Bench::new(sample_fs());
    dll.schedule_beacon(Ti(0)).unwrap();

    let mut wake = dll.systask(Ti(0), &mut bench.ports());
    for _ in 0..64 {
        if dll.state() == DllState::CcaPending {
            break;
        }
        wake = dll.systask(wake, &mut bench.ports());
    }
    assert_eq!(dll.state(), DllState::CcaPending);
    dll.rfevt_txcsma(true, &mut bench.ports());

    let frame = bench.radio.sent()[0].to_vec();
    assert_eq!(frame[3], 0x02, "broadcast, UID source");
    let body = &frame[5 + 8..frame.len() - 2];
    assert_eq!(
        body,
        &[
            cmd::EXT | cmd::TYPE_NA2P,
            cmd::EXT_NORESP,
            0x00,
            2, 1, 0, // call
            1, 0x00, 0x05, 0x00, 0xDE, 0xAD, // return
        ]
    );

    // One redundant copy after the guard interval.
    dll.rfevt_ftx(true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::CsmaWait);
    dll.systask(conf.csma.tg, &mut bench.ports());
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());
    assert_eq!(bench.radio.sent().len(), 2);

    assert_eq!(dll.state(), DllState::Idle);
    let next = dll.sessions(|st| st.session_top().map(|s| s.counter));
    assert!(next.is_some_and(|t| t > Ti(0) && t <= conf.beacon.interval));
}

fn request_applet(dll: &mut Dll, session: &mut Session, _ports: &mut Ports<'_>) {
    session.netstate.set_substate(Substate::ReqTx);
    session.flags = flags::VID;
    dll.m2np
        .header(session, Addressing::Broadcast, false, &dll.netconf)
        .unwrap();
    Transport::write_request(
        &mut dll.m2np.txq,
        cmd::TYPE_NA2P,
        None,
        0x04,
    )
    .unwrap();
    dll.m2np.txq.write_bytes(&[4, 1, 0]).unwrap();
    dll.m2np.footer(None).unwrap();
    dll.comm.rx_timeout = Ti(64);
    dll.comm.set_tx_channel(session.channel);
}

#[test]
fn request_waits_for_response_and_records_ack() {
    let mut dll = Dll::new(netconf());
    let mut bench = Bench::new(sample_fs());
    dll.session_new(
        Some(request_applet),
        Ti(0),
        0xF0,
        0x10,
        NetState::new(NetState::REQTX | NetState::INIT),
    )
    .unwrap();
    dll.systask(Ti(0), &mut bench.ports());
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    assert_eq!(
        bench.radio.last_call(),
        Some(&RadioCall::RxInit {
            channel: 0x10,
            timeout: Ti(64)
        })
    );

    let sent = bench.radio.sent()[0].to_vec();
    let dialog = sent[4];
    let resp = frame(
        0xF0,
        FI_VID,
        dialog.wrapping_add(1),
        &[0xAA, 0xBB],
        &[0x12, 0x34],
        &[0x00, 1, 0x00, 0x01, 0x00, 0x77],
    );
    dll.rfevt_frx(&resp, true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
    assert_eq!(dll.m2qp.acks().len(), 1);
    assert_eq!(dll.m2qp.acks()[0].as_slice(), &[0xAA, 0xBB]);
    assert_eq!(dll.m2qp.response(), &[1, 0x00, 0x01, 0x00, 0x77]);
}

#[test]
fn radio_events_channel_drives_the_dialog() {
    let (mut dll, mut bench) = scanning(sample_fs());
    let req = broadcast_request(5, &[cmd::TYPE_NA2P, 0x00, 4, 1, 0]);
    let mut frame: heapless::Vec<u8, 256> = heapless::Vec::new();
    frame.extend_from_slice(&req).unwrap();
    assert!(events::post(RadioEvent::RxDone { frame, crc_ok: true }));
    assert!(events::post(RadioEvent::CcaResult(true)));
    assert!(events::post(RadioEvent::TxDone(true)));

    assert_eq!(dll.poll_radio_events(&mut bench.ports()), 3);
    assert_eq!(bench.radio.sent().len(), 1);
    assert_eq!(dll.state(), DllState::Idle);
}

/// Broadcast request, response window `Ti(64)`, arbitrated so every
/// responder in the window is collected.
fn a2p_request_applet(dll: &mut Dll, session: &mut Session, ports: &mut Ports<'_>) {
    request_applet(dll, session, ports);
    dll.comm.csmaca_params = params::RIGD | params::A2P;
}

fn response_from(src: [u8; 2], dialog: u8, value: u8) -> Vec<u8> {
    frame(0xF0, FI_VID, dialog, &src, &[0x56, 0x78], &[0x00, 1, 0x00, 0x01, 0x00, value])
}

#[test]
fn a2p_request_collects_every_responder_in_the_window() {
    let mut conf = netconf();
    conf.device.vid = [0x56, 0x78];
    let mut dll = Dll::new(conf);
    let mut bench = Bench::new(sample_fs());
    dll.session_new(
        Some(a2p_request_applet),
        Ti(0),
        0xF0,
        0x10,
        NetState::new(NetState::REQTX | NetState::INIT),
    )
    .unwrap();
    dll.systask(Ti(0), &mut bench.ports());
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    let dialog = bench.radio.sent()[0][4];

    dll.systask(Ti(10), &mut bench.ports());
    let first = response_from([0x12, 0x34], dialog.wrapping_add(1), 0x01);
    dll.rfevt_frx(&first, true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    assert_eq!(
        bench.radio.last_call(),
        Some(&RadioCall::RxInit {
            channel: 0x10,
            timeout: Ti(54)
        })
    );

    dll.systask(Ti(4), &mut bench.ports());
    let second = response_from([0xCC, 0xDD], dialog.wrapping_add(1), 0x02);
    dll.rfevt_frx(&second, true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    assert_eq!(
        bench.radio.last_call(),
        Some(&RadioCall::RxInit {
            channel: 0x10,
            timeout: Ti(50)
        })
    );
    assert_eq!(dll.m2qp.acks().len(), 2);
    assert_eq!(dll.m2qp.acks()[1].as_slice(), &[0xCC, 0xDD]);
    assert_eq!(dll.m2qp.response(), &[1, 0x00, 0x01, 0x00, 0x02]);

    dll.rfevt_rxtimeout(&mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);

    // The ack list of the follow-up request silences both responders.
    let mut acks = FrameQueue::new();
    dll.m2qp.write_ack_list(&mut acks, true).unwrap();
    assert_eq!(acks.as_slice(), &[2, 0x12, 0x34, 0xCC, 0xDD]);
    dll.m2qp.clear_acks();
    assert!(dll.m2qp.acks().is_empty());

    let (mut responder, mut bench) = scanning(MemFs::new().with_file(3, &[0x00, 0x2A]));
    let mut payload = vec![cmd::TYPE_A2P_SUBSEQUENT | cmd::OP_COLLECT_FILE, 0x00];
    payload.extend_from_slice(acks.as_slice());
    payload.extend_from_slice(&[2, 0x21, 0x00, 0x2A, 3, 0]);
    payload.extend_from_slice(&[2, 3, 0]);
    responder.rfevt_frx(&broadcast_request(9, &payload), true, &mut bench.ports());
    assert_eq!(responder.state(), DllState::Idle);
    assert!(bench.radio.sent().is_empty());
}

#[test]
fn response_without_a2p_closes_the_window() {
    let mut dll = Dll::new(netconf());
    let mut bench = Bench::new(sample_fs());
    dll.session_new(
        Some(request_applet),
        Ti(0),
        0xF0,
        0x10,
        NetState::new(NetState::REQTX | NetState::INIT),
    )
    .unwrap();
    dll.systask(Ti(0), &mut bench.ports());
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());
    let top = dll.sessions(|st| st.session_top().copied()).unwrap();
    assert_eq!(top.netstate.substate(), Substate::RespRx);
    assert!(!top.netstate.contains(NetState::LISTEN));
}

/// Drive a staged response through CSMA and TX.
fn send_staged(dll: &mut Dll, bench: &mut Bench) {
    while dll.state() == DllState::CsmaWait {
        let wait = dll.next_wakeup();
        dll.systask(wait, &mut bench.ports());
    }
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());
}

fn listen_request(dialog: u8, timeout: u8) -> Vec<u8> {
    frame(
        0xF0,
        0x80 | FI_VID | FI_BROADCAST,
        dialog,
        &[0xAA, 0xBB],
        &[],
        &[cmd::TYPE_NA2P | cmd::OP_ANNOUNCE_FILE, timeout, 4, 1, 0],
    )
}

#[test]
fn listen_request_keeps_the_dialog_open_after_responding() {
    let (mut dll, mut bench) = scanning(sample_fs());
    dll.rfevt_frx(&listen_request(5, 0x02), true, &mut bench.ports());

    let (count, follower) = dll.sessions(|st| (st.len(), st.session_follower().copied()));
    assert_eq!(count, 2);
    let follower = follower.unwrap();
    assert_eq!(follower.counter, Ti(2));
    assert_eq!(follower.channel, 0x10);
    assert_eq!(follower.dialog_id, 6);
    assert_eq!(follower.netstate.substate(), Substate::ReqRx);
    assert!(follower.is_connected());

    send_staged(&mut dll, &mut bench);
    assert_eq!(bench.radio.sent().len(), 1);
    assert_eq!(dll.state(), DllState::Idle);
    let wait = dll.next_wakeup();
    assert!(wait <= Ti(2));
    dll.systask(wait, &mut bench.ports());
    assert_eq!(
        bench.radio.last_call(),
        Some(&RadioCall::RxInit {
            channel: 0x10,
            timeout: Ti(128)
        })
    );

    // Next frame of the same dialog is answered; a repeat of the old ID
    // would not be.
    dll.rfevt_frx(&listen_request(7, 0x00), true, &mut bench.ports());
    assert!(matches!(dll.state(), DllState::CsmaWait | DllState::CcaPending));
    send_staged(&mut dll, &mut bench);
    assert_eq!(bench.radio.sent().len(), 2);
    assert_eq!(bench.radio.sent()[1][4], 8);
}

#[test]
fn response_window_is_clamped_to_the_next_session() {
    let (mut dll, mut bench) = scanning(sample_fs());
    dll.schedule_scan(Ti(3)).unwrap();
    // Requested window is 16 ti; the queued scan is due in 3.
    dll.rfevt_frx(&listen_request(5, 0x14), true, &mut bench.ports());

    let windows: Vec<(Ti, Substate)> = dll.sessions(|st| {
        st.iter()
            .skip(1)
            .map(|s| (s.counter, s.netstate.substate()))
            .collect()
    });
    assert_eq!(windows.len(), 2);
    assert!(windows.contains(&(Ti(3), Substate::ReqRx)));
    assert!(windows.iter().all(|(wait, _)| *wait <= Ti(3)));
}

/// Listen on 0x10 for `Ti(40)`, one retry.
fn short_listen_applet(dll: &mut Dll, session: &mut Session, _ports: &mut Ports<'_>) {
    session.netstate.set_substate(Substate::ReqRx);
    dll.comm.rx_timeout = Ti(40);
    dll.comm.redundants.set(1);
}

#[test]
fn relisten_keeps_the_applet_window() {
    let mut dll = Dll::new(netconf());
    let mut bench = Bench::new(sample_fs());
    dll.session_new(
        Some(short_listen_applet),
        Ti(0),
        0xF0,
        0x10,
        NetState::new(NetState::REQRX | NetState::INIT),
    )
    .unwrap();
    dll.systask(Ti(0), &mut bench.ports());
    dll.rfevt_rxtimeout(&mut bench.ports());
    assert_eq!(dll.state(), DllState::Rx);
    assert_eq!(
        bench.radio.calls,
        vec![
            RadioCall::RxInit {
                channel: 0x10,
                timeout: Ti(40)
            },
            RadioCall::RxInit {
                channel: 0x10,
                timeout: Ti(40)
            },
        ]
    );
    dll.rfevt_rxtimeout(&mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);
}

/// Broadcast with no response window; leaves the channel list alone.
fn unanswered_request(dll: &mut Dll, session: &mut Session, _ports: &mut Ports<'_>) {
    session.netstate.set_substate(Substate::ReqTx);
    session.flags = flags::VID;
    dll.m2np
        .header(session, Addressing::Broadcast, false, &dll.netconf)
        .unwrap();
    Transport::write_request(&mut dll.m2np.txq, cmd::TYPE_NA2P, Some(cmd::EXT_NORESP), 0).unwrap();
    dll.m2np.txq.write_bytes(&[4, 1, 0]).unwrap();
    dll.m2np.footer(None).unwrap();
    dll.comm.rx_timeout = Ti::ZERO;
}

fn hopping_request(dll: &mut Dll, session: &mut Session, ports: &mut Ports<'_>) {
    unanswered_request(dll, session, ports);
    dll.comm.set_tx_channel(0x2A);
}

#[test]
fn request_without_channel_list_uses_its_session_channel() {
    let mut dll = Dll::new(netconf());
    let mut bench = Bench::new(sample_fs());
    for applet in [hopping_request as dash7_m2::session::Applet, unanswered_request] {
        dll.session_new(
            Some(applet),
            Ti(0),
            0xF0,
            0x10,
            NetState::new(NetState::REQTX | NetState::INIT),
        )
        .unwrap();
    }

    dll.systask(Ti(0), &mut bench.ports());
    assert_eq!(bench.radio.last_call(), Some(&RadioCall::Cca { channel: 0x2A }));
    dll.rfevt_txcsma(true, &mut bench.ports());
    dll.rfevt_ftx(true, &mut bench.ports());
    assert_eq!(dll.state(), DllState::Idle);

    dll.systask(Ti(0), &mut bench.ports());
    assert_eq!(bench.radio.last_call(), Some(&RadioCall::Cca { channel: 0x10 }));
}
