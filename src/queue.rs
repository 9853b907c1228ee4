//! Cursor-based frame queue.
//!
//! ```text
//!  front        getcursor          putcursor          back      CAPACITY
//!    │              │                  │                │           │
//!    ▼              ▼                  ▼                ▼           ▼
//!    ┌──────────────┬──────────────────┬────────────────┬───────────┐
//!    │  consumed    │   unread data    │  free space    │ (limited) │
//!    └──────────────┴──────────────────┴────────────────┴───────────┘
//! ```
//!
//! The get and put cursors advance independently: the codec writes a
//! header with `put`, a later stage patches bytes behind it, and the
//! parser walks the same buffer with `get`.  Writes never pass `back`
//! and a rejected write leaves the queue untouched.

use crate::error::QueueError;

/// Backing storage for one frame (max PHY frame plus slack).
pub const QUEUE_CAPACITY: usize = 256;

pub struct FrameQueue {
    data: [u8; QUEUE_CAPACITY],
    front: usize,
    back: usize,
    getcursor: usize,
    putcursor: usize,
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameQueue {
    pub const fn new() -> Self {
        Self {
            data: [0; QUEUE_CAPACITY],
            front: 0,
            back: QUEUE_CAPACITY,
            getcursor: 0,
            putcursor: 0,
        }
    }

    /// Reset both cursors and lift the write limit.
    pub fn empty(&mut self) {
        self.front = 0;
        self.back = QUEUE_CAPACITY;
        self.getcursor = 0;
        self.putcursor = 0;
    }

    /// Replace the contents with `bytes` (inbound frames).
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), QueueError> {
        if bytes.len() > QUEUE_CAPACITY {
            return Err(QueueError::Capacity);
        }
        self.empty();
        self.write_bytes(bytes)
    }

    /// Set the write limit, measured from `front`.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), QueueError> {
        let back = self.front + limit;
        if back > QUEUE_CAPACITY || back < self.putcursor {
            return Err(QueueError::Capacity);
        }
        self.back = back;
        Ok(())
    }

    /// Drop everything written past `len` bytes from `front`.
    pub fn truncate(&mut self, len: usize) -> Result<(), QueueError> {
        let end = self.front + len;
        if end > self.putcursor {
            return Err(QueueError::Underrun);
        }
        self.putcursor = end;
        self.getcursor = self.getcursor.min(end);
        Ok(())
    }

    // ── Inspection ────────────────────────────────────────────

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.putcursor - self.front
    }

    pub fn is_empty(&self) -> bool {
        self.putcursor == self.front
    }

    /// Free bytes before the write limit.
    pub fn space(&self) -> usize {
        self.back - self.putcursor
    }

    /// Unread bytes.
    pub fn remaining(&self) -> usize {
        self.putcursor - self.getcursor
    }

    pub fn get_cursor(&self) -> usize {
        self.getcursor
    }

    pub fn put_cursor(&self) -> usize {
        self.putcursor
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.front..self.putcursor]
    }

    /// Unread bytes, without consuming them.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.getcursor..self.putcursor]
    }

    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        (pos < self.putcursor).then(|| self.data[pos])
    }

    // ── Cursor moves ──────────────────────────────────────────

    pub fn set_get_cursor(&mut self, pos: usize) -> Result<(), QueueError> {
        if pos < self.front || pos > self.putcursor {
            return Err(QueueError::Underrun);
        }
        self.getcursor = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), QueueError> {
        if n > self.remaining() {
            return Err(QueueError::Underrun);
        }
        self.getcursor += n;
        Ok(())
    }

    // ── Writes ────────────────────────────────────────────────

    pub fn write_byte(&mut self, byte: u8) -> Result<(), QueueError> {
        if self.space() < 1 {
            return Err(QueueError::Full);
        }
        self.data[self.putcursor] = byte;
        self.putcursor += 1;
        Ok(())
    }

    /// Big-endian 16-bit write.
    pub fn write_short(&mut self, value: u16) -> Result<(), QueueError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), QueueError> {
        if bytes.len() > self.space() {
            return Err(QueueError::Full);
        }
        let end = self.putcursor + bytes.len();
        self.data[self.putcursor..end].copy_from_slice(bytes);
        self.putcursor = end;
        Ok(())
    }

    /// Overwrite an already-written byte (length/LC patching).
    pub fn set_byte(&mut self, pos: usize, byte: u8) -> Result<(), QueueError> {
        if pos < self.front || pos >= self.putcursor {
            return Err(QueueError::Underrun);
        }
        self.data[pos] = byte;
        Ok(())
    }

    /// Mutable view of already-written bytes `[start, putcursor)`.
    pub fn written_mut(&mut self, start: usize) -> Result<&mut [u8], QueueError> {
        if start < self.front || start > self.putcursor {
            return Err(QueueError::Underrun);
        }
        Ok(&mut self.data[start..self.putcursor])
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn read_byte(&mut self) -> Result<u8, QueueError> {
        if self.remaining() < 1 {
            return Err(QueueError::Underrun);
        }
        let b = self.data[self.getcursor];
        self.getcursor += 1;
        Ok(b)
    }

    /// Big-endian 16-bit read.
    /// A short read consumes nothing.
    pub fn read_short(&mut self) -> Result<u16, QueueError> {
        let mut be = [0u8; 2];
        self.read_into(&mut be)?;
        Ok(u16::from_be_bytes(be))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], QueueError> {
        if n > self.remaining() {
            return Err(QueueError::Underrun);
        }
        let start = self.getcursor;
        self.getcursor += n;
        Ok(&self.data[start..start + n])
    }

    /// Read into a caller buffer, filling it completely.
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<(), QueueError> {
        let src = self.read_bytes(out.len())?;
        out.copy_from_slice(src);
        Ok(())
    }
}
