//! CSMA-CA flow controller.
//!
//! Computes the wait before each transmission attempt from the contention
//! window `tc` held in [`Comm`].  The algorithm is chosen by the
//! `csmaca_params` byte:
//!
//! | bits        | algorithm | first offset            | later rounds          |
//! |-------------|-----------|-------------------------|-----------------------|
//! | `0x00`      | RIGD      | rand in `[0, tc/2)`     | halve `tc`, rand      |
//! | `0x10`      | RAIND     | rand in `[0, tc - Tfd)` | `+Tfd`                |
//! | `0x20`      | AIND      | 0                       | `+Tfd`                |
//! | `0x08` set  | no-CA     | 0                       | `Tg`                  |
//!
//! All arithmetic is in [`Clk`].  `tc` only shrinks until the next
//! [`Comm::fc_init`]; `redundants` only counts down.

use core::cell::Cell;

use critical_section::Mutex;
use heapless::Vec;
use log::debug;
use rand_core::RngCore;

use crate::time::{Clk, Ti};

/// Maximum channels in a TX/RX channel list.
pub const MAX_CHANNELS: usize = 8;

/// `csmaca_params` bits.
pub mod params {
    pub const ALGO: u8 = 0x30;
    pub const RIGD: u8 = 0x00;
    pub const RAIND: u8 = 0x10;
    pub const AIND: u8 = 0x20;
    pub const NOCA: u8 = 0x08;
    /// Arbitrated dialog (A2P).
    pub const A2P: u8 = 0x04;
    /// Bits a command extension may set.
    pub const CMD_EXT_MASK: u8 = ALGO | NOCA;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsmaAlgorithm {
    Rigd,
    Raind,
    Aind,
    NoCa,
}

impl CsmaAlgorithm {
    pub fn from_params(p: u8) -> Self {
        if p & params::NOCA != 0 {
            return Self::NoCa;
        }
        match p & params::ALGO {
            params::RAIND => Self::Raind,
            params::AIND => Self::Aind,
            // 0x30 is reserved and falls back to RIGD.
            _ => Self::Rigd,
        }
    }
}

// ---------------------------------------------------------------------------
// Redundant-transmission counter
// ---------------------------------------------------------------------------

/// Retry budget shared between the DLL task and the radio ISR.
pub struct Redundants(Mutex<Cell<u8>>);

impl Redundants {
    pub const fn new(n: u8) -> Self {
        Self(Mutex::new(Cell::new(n)))
    }

    pub fn get(&self) -> u8 {
        critical_section::with(|cs| self.0.borrow(cs).get())
    }

    /// Load a fresh budget for a new request.
    pub fn set(&self, n: u8) {
        critical_section::with(|cs| self.0.borrow(cs).set(n));
    }

    /// Spend one retry.  Returns `false` (and stays at 0) when none are left.
    pub fn take_one(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.0.borrow(cs);
            match cell.get() {
                0 => false,
                n => {
                    cell.set(n - 1);
                    true
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Comm parameters
// ---------------------------------------------------------------------------

/// Per-request communication and flow-control parameters (`dll.comm`).
pub struct Comm {
    /// Contention window.
    pub tc: Clk,
    /// Remaining window countdown.
    pub tca: Clk,
    /// Air-time of the staged frame.
    pub frame_duration: Clk,
    /// Guard interval used by no-CA.
    pub tg: Clk,
    pub redundants: Redundants,
    pub csmaca_params: u8,
    /// Response window (requester side).
    pub rx_timeout: Ti,
    pub tx_channels: Vec<u8, MAX_CHANNELS>,
    pub rx_channels: Vec<u8, MAX_CHANNELS>,
    tx_index: usize,
}

impl Comm {
    pub const fn new(tg: Clk) -> Self {
        Self {
            tc: Clk::ZERO,
            tca: Clk::ZERO,
            frame_duration: Clk::ZERO,
            tg,
            redundants: Redundants::new(0),
            csmaca_params: params::RIGD,
            rx_timeout: Ti::ZERO,
            tx_channels: Vec::new(),
            rx_channels: Vec::new(),
            tx_index: 0,
        }
    }

    pub fn algorithm(&self) -> CsmaAlgorithm {
        CsmaAlgorithm::from_params(self.csmaca_params)
    }

    /// Replace the TX channel list with a single channel.
    pub fn set_tx_channel(&mut self, channel: u8) {
        self.tx_channels.clear();
        // Capacity is at least one.
        let _ = self.tx_channels.push(channel);
        self.tx_index = 0;
    }

    /// Channel for the current attempt.
    pub fn tx_channel(&self) -> Option<u8> {
        self.tx_channels.get(self.tx_index).copied()
    }

    /// Move to the next channel in the (scrambled) list.
    pub fn next_tx_channel(&mut self) {
        if !self.tx_channels.is_empty() {
            self.tx_index = (self.tx_index + 1) % self.tx_channels.len();
        }
    }

    /// `sub_fcinit`: start a CSMA sequence and return the first offset.
    pub fn fc_init<R: RngCore + ?Sized>(&mut self, rng: &mut R, frame_duration: Clk) -> Clk {
        self.frame_duration = frame_duration;
        self.tx_index = 0;
        if self.tx_channels.len() > 1 {
            csma_scramble(&mut self.tx_channels, rng);
        }

        let offset = match self.algorithm() {
            CsmaAlgorithm::Rigd => {
                if self.tc.0 <= 1 {
                    self.tc = Clk::ZERO;
                }
                self.tca = self.tc;
                rigd_round(&mut self.tc, rng)
            }
            CsmaAlgorithm::Raind => {
                let span = self.tc.saturating_sub(frame_duration);
                let offset = if span.is_zero() {
                    Clk::ZERO
                } else {
                    Clk(rand16(rng) % span.0)
                };
                self.tca = self.tc.saturating_sub(offset);
                offset
            }
            CsmaAlgorithm::Aind | CsmaAlgorithm::NoCa => {
                self.tca = self.tc;
                Clk::ZERO
            }
        };
        debug!(
            "csma: init {:?} tc={} offset={}",
            self.algorithm(),
            self.tc.0,
            offset.0
        );
        offset
    }

    /// `sub_fcloop`: offset for the next attempt after a contended one, or
    /// `None` once the contention window is exhausted.
    pub fn fc_loop<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> Option<Clk> {
        match self.algorithm() {
            CsmaAlgorithm::Rigd => {
                if self.tc.is_zero() {
                    None
                } else {
                    Some(rigd_round(&mut self.tc, rng))
                }
            }
            CsmaAlgorithm::Raind | CsmaAlgorithm::Aind => {
                self.tca = self.tca.saturating_sub(self.frame_duration);
                (self.tca >= self.frame_duration && !self.frame_duration.is_zero())
                    .then_some(self.frame_duration)
            }
            CsmaAlgorithm::NoCa => Some(self.tg),
        }
    }
}

/// One RIGD round: halve `tc`, then pick an offset in `[0, tc)`.  A window
/// of one tick carries no randomness and collapses to zero.
pub fn rigd_round<R: RngCore + ?Sized>(tc: &mut Clk, rng: &mut R) -> Clk {
    let half = tc.0 / 2;
    *tc = Clk(if half <= 1 { 0 } else { half });
    if tc.is_zero() {
        Clk::ZERO
    } else {
        Clk(rand16(rng) % tc.0)
    }
}

/// Permute every entry after the first (Fisher-Yates).
pub fn csma_scramble<R: RngCore + ?Sized>(list: &mut [u8], rng: &mut R) {
    if list.len() < 3 {
        return;
    }
    for i in (2..list.len()).rev() {
        let j = 1 + rand16(rng) as usize % i;
        list.swap(i, j);
    }
}

fn rand16<R: RngCore + ?Sized>(rng: &mut R) -> u32 {
    rng.next_u32() & 0xFFFF
}
