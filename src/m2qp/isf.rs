//! ISF call templates and the return-frame builder.
//!
//! Call (inbound):
//! ```text
//! file:   [max-bytes][id][offset:1]
//! series: [max-bytes][count][id * count][offset:2]
//! ```
//! Return (outbound):
//! ```text
//! file:   [id][total-len:2][offset:1][data...]
//! series: [count]{[id][len:2]}*count[offset:2][data...]
//! ```

use log::debug;

use super::query::{QueryTarget, SCORE_FILE_ERROR, load_isf, open_readable};
use crate::error::QueueError;
use crate::m2np::FOOTER_LEN;
use crate::ports::{AuthPort, FilePort, UserId};
use crate::queue::FrameQueue;

/// A parsed call template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsfCall {
    /// Largest data window the caller accepts.
    pub max_bytes: u8,
    pub target: QueryTarget,
}

impl IsfCall {
    pub fn parse(q: &mut FrameQueue, is_series: bool) -> Result<Self, QueueError> {
        let max_bytes = q.read_byte()?;
        let target = QueryTarget::parse(q, is_series)?;
        Ok(Self { max_bytes, target })
    }

    /// Call for the first `max_bytes` of one file.
    pub fn file(id: u8, max_bytes: u8) -> Self {
        Self {
            max_bytes,
            target: QueryTarget::file(id, 0),
        }
    }
}

/// Write the return header and data window for `call` into `txq`.
///
/// The window is clamped to `max_bytes`, to the frame space left after the
/// CRC footer, and to the file data past `offset`.  Returns the number of
/// data bytes written, `-1` if the header does not fit, or
/// [`SCORE_FILE_ERROR`].
pub fn isf_return(
    call: &IsfCall,
    txq: &mut FrameQueue,
    user: UserId,
    fs: &mut dyn FilePort,
    auth: &dyn AuthPort,
) -> i16 {
    let target = &call.target;
    let files = target.files();

    let total = match write_return_header(target, files, txq, user, fs, auth) {
        Ok(Some(total)) => total,
        Ok(None) => return SCORE_FILE_ERROR,
        Err(e) => {
            debug!("m2qp: isf return header does not fit ({})", e);
            return -1;
        }
    };

    let available = total.saturating_sub(u32::from(target.offset)) as usize;
    let room = txq.space().saturating_sub(FOOTER_LEN);
    let window = usize::from(call.max_bytes).min(room).min(available);

    load_isf(
        target.is_series,
        files,
        target.offset,
        window,
        &mut |b| txq.write_byte(b).is_ok(),
        user,
        fs,
        auth,
    )
}

/// `Ok(None)` when a file could not be opened.
fn write_return_header(
    target: &QueryTarget,
    files: &[u8],
    txq: &mut FrameQueue,
    user: UserId,
    fs: &mut dyn FilePort,
    auth: &dyn AuthPort,
) -> Result<Option<u32>, QueueError> {
    if target.is_series {
        txq.write_byte(files.len() as u8)?;
    }
    let mut total = 0u32;
    for &id in files {
        let Ok(fp) = open_readable(fs, auth, id, user) else {
            return Ok(None);
        };
        let len = fs.length(fp);
        fs.close(fp);
        txq.write_byte(id)?;
        txq.write_short(len)?;
        total += u32::from(len);
    }
    if target.is_series {
        txq.write_short(target.offset)?;
    } else {
        txq.write_byte(target.offset as u8)?;
    }
    Ok(Some(total))
}
