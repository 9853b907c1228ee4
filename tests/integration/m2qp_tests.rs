//! Transport-layer integration tests: ISF returns against the mock file
//! store, and query-driven collection requests through the network layer.

use dash7_m2::StackConfig;
use dash7_m2::csma::Comm;
use dash7_m2::m2np::{FOOTER_LEN, Network};
use dash7_m2::m2qp::isf::{IsfCall, isf_return};
use dash7_m2::m2qp::query::{QueryTarget, SCORE_FILE_ERROR, code};
use dash7_m2::m2qp::{Transport, cmd};
use dash7_m2::ports::{StandardAuth, UserId};
use dash7_m2::queue::FrameQueue;
use dash7_m2::session::{NetState, Session, Substate};
use dash7_m2::time::{Clk, Ti};

use crate::mock_hw::{Bench, MemFs, broadcast_request};

fn returned(call: &IsfCall, fs: &mut MemFs, user: UserId) -> (i16, Vec<u8>) {
    let mut q = FrameQueue::new();
    let n = isf_return(call, &mut q, user, fs, &StandardAuth);
    (n, q.as_slice().to_vec())
}

// ── ISF return ────────────────────────────────────────────────

#[test]
fn isf_return_is_repeatable_and_read_only() {
    let data: Vec<u8> = (0..10).collect();
    let mut fs = MemFs::new().with_file(0x12, &data);
    let call = IsfCall::file(0x12, 16);

    let first = returned(&call, &mut fs, UserId::Guest);
    let second = returned(&call, &mut fs, UserId::Guest);

    assert_eq!(first, second);
    assert_eq!(first.0, 10);
    assert_eq!(&first.1[..4], &[0x12, 0x00, 0x0A, 0x00]);
    assert_eq!(&first.1[4..], data.as_slice());
    assert_eq!(fs.contents(0x12), Some(data.as_slice()));
    assert_eq!(fs.open_count, fs.close_count);
}

#[test]
fn isf_return_clamps_to_max_bytes_and_offset() {
    let data: Vec<u8> = (0..10).collect();
    let mut fs = MemFs::new().with_file(3, &data);

    let (n, bytes) = returned(&IsfCall::file(3, 4), &mut fs, UserId::Guest);
    assert_eq!(n, 4);
    assert_eq!(&bytes[4..], &[0, 1, 2, 3]);

    let mut call = IsfCall::file(3, 16);
    call.target = QueryTarget::file(3, 7);
    let (n, bytes) = returned(&call, &mut fs, UserId::Guest);
    assert_eq!(n, 3);
    assert_eq!(bytes[3], 7, "offset echoed in the header");
    assert_eq!(&bytes[4..], &[7, 8, 9]);

    call.target = QueryTarget::file(3, 40);
    let (n, bytes) = returned(&call, &mut fs, UserId::Guest);
    assert_eq!(n, 0);
    assert_eq!(bytes.len(), 4);
}

#[test]
fn isf_return_clamps_to_frame_space() {
    let data = [0xEE; 64];
    let mut fs = MemFs::new().with_file(1, &data);
    let mut q = FrameQueue::new();
    q.set_limit(20).unwrap();

    let n = isf_return(&IsfCall::file(1, 64), &mut q, UserId::Guest, &mut fs, &StandardAuth);
    assert_eq!(n, 20 - 4 - FOOTER_LEN as i16);
    assert_eq!(q.space(), FOOTER_LEN);
}

#[test]
fn series_return_header_lists_every_file() {
    let mut fs = MemFs::new().with_file(1, b"abc").with_file(2, b"de");
    let mut q = FrameQueue::new();
    q.write_bytes(&[10, 2, 1, 2, 0x00, 0x02]).unwrap();
    let call = IsfCall::parse(&mut q, true).unwrap();
    assert_eq!(call.target.files(), &[1, 2]);

    let (n, bytes) = returned(&call, &mut fs, UserId::Guest);
    assert_eq!(n, 3);
    assert_eq!(
        bytes,
        [2, 1, 0x00, 0x03, 2, 0x00, 0x02, 0x00, 0x02, b'c', b'd', b'e']
    );
}

#[test]
fn access_rights_follow_the_user() {
    let mut fs = MemFs::new();
    fs.insert(5, &[1, 2, 3], 0x00);
    fs.insert(6, &[4, 5, 6], 0x20);

    let (n, _) = returned(&IsfCall::file(5, 8), &mut fs, UserId::Guest);
    assert_eq!(n, SCORE_FILE_ERROR);
    let (n, _) = returned(&IsfCall::file(5, 8), &mut fs, UserId::Root);
    assert_eq!(n, 3);

    let (n, _) = returned(&IsfCall::file(6, 8), &mut fs, UserId::Guest);
    assert_eq!(n, SCORE_FILE_ERROR);
    let (n, bytes) = returned(&IsfCall::file(6, 8), &mut fs, UserId::User);
    assert_eq!(n, 3);
    assert_eq!(&bytes[4..], &[4, 5, 6]);
    assert_eq!(fs.open_count, fs.close_count);
}

#[test]
fn missing_file_is_a_file_error() {
    let mut fs = MemFs::new();
    let (n, _) = returned(&IsfCall::file(9, 8), &mut fs, UserId::Root);
    assert_eq!(n, SCORE_FILE_ERROR);
}

#[test]
fn isf_call_reads_the_template_from_the_received_frame() {
    let mut bench = Bench::new(MemFs::new().with_file(3, &[9, 8, 7, 6, 5]));
    let mut net = Network::new();
    let mut m2qp = Transport::new();
    net.rxq.load(&[2, 3, 1]).unwrap();

    let n = m2qp.isf_call(false, &mut net, UserId::Guest, &mut bench.ports());
    assert_eq!(n, 2);
    assert_eq!(net.txq.as_slice(), &[3, 0x00, 0x05, 1, 8, 7]);

    net.rxq.load(&[2, 3]).unwrap();
    assert_eq!(m2qp.isf_call(false, &mut net, UserId::Guest, &mut bench.ports()), -1);
}

// ── Collection requests with a query ──────────────────────────

/// Series query, series return.
const COLLECT_SERIES_TO_SERIES: u8 = cmd::OP_COLLECT_SERIES | 0x01;

/// A2P initial series collection over files 1 and 2, searching for `token`.
fn search_request(token: &[u8], threshold: u8) -> Vec<u8> {
    let query = |p: &mut Vec<u8>| {
        p.push(token.len() as u8);
        p.push(code::STRING | threshold);
        p.extend_from_slice(token);
        p.extend_from_slice(&[2, 1, 2, 0x00, 0x00]);
    };
    let mut p = vec![cmd::TYPE_A2P_INITIAL | COLLECT_SERIES_TO_SERIES, 0x00];
    query(&mut p);
    query(&mut p);
    p.extend_from_slice(&[16, 2, 1, 2, 0x00, 0x00]);
    p
}

struct Rig {
    net: Network,
    m2qp: Transport,
    comm: Comm,
    netconf: StackConfig,
    session: Session,
    bench: Bench,
}

impl Rig {
    fn new() -> Self {
        let mut netconf = StackConfig::default();
        netconf.device.vid = [0x12, 0x34];
        Self {
            net: Network::new(),
            m2qp: Transport::new(),
            comm: Comm::new(Clk::ZERO),
            netconf,
            session: Session {
                counter: Ti::ZERO,
                channel: 0x10,
                netstate: NetState::new(NetState::REQRX),
                flags: 0,
                dialog_id: 0,
                subnet: 0xF0,
                extra: 0,
                applet: None,
            },
            bench: Bench::new(MemFs::new().with_file(1, b"hot ").with_file(2, b"dog!")),
        }
    }

    fn receive(&mut self, payload: &[u8]) -> i16 {
        self.net.rxq.load(&broadcast_request(9, payload)).unwrap();
        let mut ports = self.bench.ports();
        self.net.route_ff(
            &mut self.session,
            &mut self.m2qp,
            &mut self.comm,
            &self.netconf,
            &mut ports,
        )
    }
}

#[test]
fn search_hit_returns_score_and_stages_series() {
    let mut rig = Rig::new();

    assert_eq!(rig.receive(&search_request(b"dog", 2)), 3);
    assert_eq!(rig.session.netstate.substate(), Substate::RespTx);

    let tx = rig.net.txq.as_slice();
    assert_eq!(&tx[7..9], &[0xAA, 0xBB], "unicast back to the requester");
    assert_eq!(tx[9], cmd::TYPE_RESPONSE | COLLECT_SERIES_TO_SERIES);
    let mut body = vec![2, 1, 0x00, 0x04, 2, 0x00, 0x04, 0x00, 0x00];
    body.extend_from_slice(b"hot dog!");
    assert_eq!(&tx[10..tx.len() - FOOTER_LEN], body.as_slice());
}

#[test]
fn search_across_file_boundary_matches() {
    let mut rig = Rig::new();
    assert_eq!(rig.receive(&search_request(b"t do", 4)), 4);
}

#[test]
fn search_below_threshold_stays_quiet() {
    let mut rig = Rig::new();
    assert_eq!(rig.receive(&search_request(b"dog", 4)), -1);
    assert_eq!(rig.session.netstate.substate(), Substate::ReqRx);
    assert!(rig.net.txq.is_empty());
}

#[test]
fn unknown_query_code_is_rejected() {
    let mut rig = Rig::new();
    let mut p = search_request(b"dog", 2);
    p[3] = 0x60;
    assert_eq!(rig.receive(&p), -1);
}
