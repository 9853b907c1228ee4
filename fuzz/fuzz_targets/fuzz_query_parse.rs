//! Fuzz target: query and ISF call template parsing
//!
//! Reads a query template, a query target and an ISF call from arbitrary
//! bytes, runs the comparison, then builds the return.  Parsing must fail
//! cleanly on short input, the comparison must stay inside its score range
//! and the return must leave room for the frame footer.
//!
//! cargo fuzz run fuzz_query_parse

#![no_main]

use dash7_m2::error::VlError;
use dash7_m2::m2np::FOOTER_LEN;
use dash7_m2::m2qp::isf::{IsfCall, isf_return};
use dash7_m2::m2qp::query::{QueryTarget, QueryTemplate, SCORE_FILE_ERROR, isf_comp};
use dash7_m2::ports::{Access, FileHandle, FilePort, StandardAuth, UserId};
use dash7_m2::queue::FrameQueue;
use libfuzzer_sys::fuzz_target;

/// Files 0..8, each `4 * (id + 1)` bytes of `id`.
struct Files;

impl FilePort for Files {
    fn open(&mut self, id: u8, _: Access, _: UserId) -> Result<FileHandle, VlError> {
        if id < 8 {
            Ok(FileHandle(id))
        } else {
            Err(VlError::NotFound)
        }
    }
    fn length(&self, fp: FileHandle) -> u16 {
        4 * (u16::from(fp.0) + 1)
    }
    fn modifiers(&self, _: FileHandle) -> u8 {
        0x24
    }
    fn read(&self, fp: FileHandle, offset: u16) -> Result<u16, VlError> {
        if offset >= self.length(fp) {
            return Err(VlError::OutOfRange);
        }
        Ok(u16::from_le_bytes([fp.0, fp.0]))
    }
    fn write(&mut self, _: FileHandle, _: u16, _: u16) -> Result<(), VlError> {
        Err(VlError::AccessDenied)
    }
    fn close(&mut self, _: FileHandle) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let series = flags & 0x01 != 0;
    let mut q = FrameQueue::new();
    if q.load(rest).is_err() {
        return;
    }

    let Ok(tmpl) = QueryTemplate::parse(&mut q) else {
        return;
    };
    assert_eq!(tmpl.mask.len(), tmpl.value.len());
    let Ok(target) = QueryTarget::parse(&mut q, series) else {
        return;
    };

    let mut fs = Files;
    let score = isf_comp(&tmpl, &target, UserId::Guest, &mut fs, &StandardAuth);
    assert!(score == SCORE_FILE_ERROR || (-1..=256).contains(&score));

    let Ok(call) = IsfCall::parse(&mut q, series) else {
        return;
    };
    let mut txq = FrameQueue::new();
    let n = isf_return(&call, &mut txq, UserId::Guest, &mut fs, &StandardAuth);
    assert!(n == SCORE_FILE_ERROR || n >= -1);
    if n >= 0 {
        assert!(n <= i16::from(call.max_bytes));
        assert!(txq.space() >= FOOTER_LEN);
    }
});
