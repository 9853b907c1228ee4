//! Radio completion events.
//!
//! The radio driver runs in interrupt context.  Rather than calling into
//! the DLL from the ISR it posts a [`RadioEvent`] here and the DLL task
//! drains the channel from thread context.
//!
//! ```text
//! ┌──────────────┐  RadioEvent  ┌──────────────┐
//! │  Radio ISR   │────────────▶│   DLL task    │
//! └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use crate::queue::QUEUE_CAPACITY;

pub enum RadioEvent {
    /// A frame arrived; `crc_ok` is the driver's CRC verdict.
    RxDone {
        frame: Vec<u8, QUEUE_CAPACITY>,
        crc_ok: bool,
    },
    /// The RX window closed without a frame.
    RxTimeout,
    /// Clear-channel assessment finished; `true` means clear.
    CcaResult(bool),
    /// Transmission finished; `false` on driver failure.
    TxDone(bool),
}

/// Channel depth.  One dialog step produces at most two events.
const EVENT_DEPTH: usize = 4;

/// ISR → DLL task.
pub static RADIO_EVENTS: Channel<CriticalSectionRawMutex, RadioEvent, EVENT_DEPTH> = Channel::new();

/// ISR-side helper.  Returns `false` if the channel is full and the
/// event was dropped.
pub fn post(event: RadioEvent) -> bool {
    RADIO_EVENTS.try_send(event).is_ok()
}
