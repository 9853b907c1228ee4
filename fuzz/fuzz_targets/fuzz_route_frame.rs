//! Fuzz target: `Dll::rfevt_frx`
//!
//! Opens a scan window, hands it an arbitrary received frame, then runs
//! whatever response the engine staged through CCA and TX.  The engine
//! must never panic and never hand the radio a frame longer than its
//! length byte claims.
//!
//! cargo fuzz run fuzz_route_frame

#![no_main]

use dash7_m2::error::{RadioError, VlError};
use dash7_m2::ports::{Access, FileHandle, FilePort, Ports, RadioPort, UserId};
use dash7_m2::time::Ti;
use dash7_m2::{Dll, StackConfig};
use libfuzzer_sys::fuzz_target;
use rand_core::{RngCore, impls};

#[derive(Default)]
struct Radio {
    sent: Vec<Vec<u8>>,
}

impl RadioPort for Radio {
    fn rx_init(&mut self, _: u8, _: Ti) -> Result<(), RadioError> {
        Ok(())
    }
    fn cca(&mut self, _: u8) -> Result<(), RadioError> {
        Ok(())
    }
    fn tx_init(&mut self, _: u8, frame: &[u8]) -> Result<(), RadioError> {
        self.sent.push(frame.to_vec());
        Ok(())
    }
    fn idle(&mut self) {}
}

/// Two small world-readable files, IDs 0 and 1.
struct Files;

const FILES: [&[u8]; 2] = [b"fuzz", b"0123456789abcdef"];

impl FilePort for Files {
    fn open(&mut self, id: u8, _: Access, _: UserId) -> Result<FileHandle, VlError> {
        FILES.get(usize::from(id)).ok_or(VlError::NotFound)?;
        Ok(FileHandle(id))
    }
    fn length(&self, fp: FileHandle) -> u16 {
        FILES[usize::from(fp.0)].len() as u16
    }
    fn modifiers(&self, _: FileHandle) -> u8 {
        0x24
    }
    fn read(&self, fp: FileHandle, offset: u16) -> Result<u16, VlError> {
        let f = FILES[usize::from(fp.0)];
        let at = usize::from(offset);
        let lo = *f.get(at).ok_or(VlError::OutOfRange)?;
        let hi = f.get(at + 1).copied().unwrap_or(0);
        Ok(u16::from_le_bytes([lo, hi]))
    }
    fn write(&mut self, _: FileHandle, _: u16, _: u16) -> Result<(), VlError> {
        Err(VlError::AccessDenied)
    }
    fn close(&mut self, _: FileHandle) {}
}

/// Counter-based generator; determinism keeps crashes reproducible.
struct Counter(u32);

impl RngCore for Counter {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }
    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut config = StackConfig::default();
    config.device.vid = [0x12, 0x34];
    let mut dll = Dll::new(config);
    let mut radio = Radio::default();
    let mut files = Files;
    let mut rng = Counter(0);

    {
        let mut ports = Ports::new(&mut radio, &mut files, &mut rng);
        if dll.schedule_scan(Ti::ZERO).is_err() {
            return;
        }
        dll.systask(Ti::ZERO, &mut ports);
        dll.rfevt_frx(data, true, &mut ports);

        // Drain whatever was staged: a few CCA/TX rounds at most.
        for _ in 0..4 {
            let wait = match dll.next_wakeup() {
                Ti::NEVER => Ti::ZERO,
                w => w,
            };
            dll.systask(wait, &mut ports);
            dll.rfevt_txcsma(true, &mut ports);
            dll.rfevt_ftx(true, &mut ports);
        }
        dll.flush(&mut ports);
    }

    for frame in &radio.sent {
        assert!(!frame.is_empty(), "empty frame handed to the radio");
        assert_eq!(usize::from(frame[0]), frame.len(), "length byte mismatch");
    }
});
