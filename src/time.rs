//! Tick units.
//!
//! Two clocks coexist in the stack and must never be mixed:
//!
//! - [`Ti`]: the native DASH7 tick, 1/1024 s.  Session counters, response
//!   windows and RX timeouts are expressed in `Ti`.
//! - [`Clk`]: the platform clock unit (`CLK_UNIT`, 32768 Hz).  The CSMA-CA
//!   flow controller does its arithmetic in `Clk`.
//!
//! Conversions round to nearest, so `Ti -> Clk -> Ti` is exact and
//! `Clk -> Ti -> Clk` is off by at most half a `Ti`.

use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Platform clock units per native tick.
pub const CLK_PER_TI: u32 = 32;

/// Native DASH7 tick (1/1024 s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Ti(pub u32);

/// Platform clock unit (1/32768 s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Clk(pub u32);

impl Ti {
    pub const ZERO: Self = Self(0);
    /// Sentinel for "nothing scheduled".
    pub const NEVER: Self = Self(u32::MAX);

    pub const fn to_clk(self) -> Clk {
        Clk(self.0.saturating_mul(CLK_PER_TI))
    }

    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Clk {
    pub const ZERO: Self = Self(0);

    pub const fn to_ti(self) -> Ti {
        Ti(self.0.saturating_add(CLK_PER_TI / 2) / CLK_PER_TI)
    }

    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// `TI2CLK`.
pub const fn ti_to_clk(t: Ti) -> Clk {
    t.to_clk()
}

/// `CLK2TI`.
pub const fn clk_to_ti(c: Clk) -> Ti {
    c.to_ti()
}

impl Add for Ti {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Ti {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl Add for Clk {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Clk {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

// ---------------------------------------------------------------------------
// Air-time
// ---------------------------------------------------------------------------

/// Channel bit that selects the turbo (200 kbps) symbol rate.
pub const CHANNEL_TURBO: u8 = 0x20;

/// Milli-`Clk` per byte at 55.55 kbps.
const NORMAL_MCLK_PER_BYTE: u32 = 4719;
/// Milli-`Clk` per byte at 200 kbps.
const TURBO_MCLK_PER_BYTE: u32 = 1311;

/// Air-time of a frame of `bytes` on `channel`, rounded up.
pub fn frame_duration(bytes: usize, channel: u8) -> Clk {
    let rate = if channel & CHANNEL_TURBO != 0 {
        TURBO_MCLK_PER_BYTE
    } else {
        NORMAL_MCLK_PER_BYTE
    };
    Clk((bytes as u32 * rate).div_ceil(1000))
}

/// Decode a DASH7 exponent/mantissa timeout byte (`m * 4^e`, bit 7 ignored).
pub fn timeout_decode(code: u8) -> Ti {
    let exp = u32::from((code >> 4) & 0x07);
    let mantissa = u32::from(code & 0x0F);
    Ti(mantissa << (2 * exp))
}

/// Smallest timeout code whose decoded window is at least `t`.
pub fn timeout_encode(t: Ti) -> u8 {
    for exp in 0u8..8 {
        let unit = 1u32 << (2 * exp);
        let mantissa = t.0.div_ceil(unit);
        if mantissa <= 0x0F {
            return (exp << 4) | mantissa as u8;
        }
    }
    0x7F
}
