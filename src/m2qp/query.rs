//! Query templates and the ISF comparison engine.
//!
//! A query names a data element (one ISF or a series of ISFs), a byte
//! window inside it, and a comparison:
//!
//! | code bits | meaning                                         |
//! |-----------|-------------------------------------------------|
//! | `0x80`    | mask bytes follow the length                    |
//! | `0x60`    | type: `0x00` non-null, `0x20` ALU, `0x40` string |
//! | `0x1F`    | ALU operator, or string-search threshold        |
//!
//! Scores: `>= 0` success, `-1` query failed, [`SCORE_FILE_ERROR`] when
//! the file collaborator refused an open or read.

use core::cmp::Ordering;

use heapless::Vec;
use log::{debug, warn};

use crate::error::{QueueError, VlError};
use crate::ports::{Access, AuthPort, FileHandle, FilePort, UserId, read_byte};
use crate::queue::FrameQueue;

/// Sentinel for a file-system failure; outside every valid score.
pub const SCORE_FILE_ERROR: i16 = i16::MIN;
/// Longest comparison token.
pub const MAX_TOKEN: usize = 32;
/// Longest file series.
pub const MAX_SERIES: usize = 8;
/// Bytes a string search can scan.
const SEARCH_WINDOW: usize = 256;

pub mod code {
    pub const MASK: u8 = 0x80;
    pub const TYPE: u8 = 0x60;
    pub const NON_NULL: u8 = 0x00;
    pub const ALU: u8 = 0x20;
    pub const STRING: u8 = 0x40;
    pub const PARAM: u8 = 0x1F;
}

/// Relational operator of an ALU query; the file bytes are the left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Ne,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl AluOp {
    pub const fn from_param(p: u8) -> Option<Self> {
        match p {
            0 => Some(Self::Ne),
            1 => Some(Self::Eq),
            2 => Some(Self::Lt),
            3 => Some(Self::Le),
            4 => Some(Self::Gt),
            5 => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Ne => ord.is_ne(),
            Self::Eq => ord.is_eq(),
            Self::Lt => ord.is_lt(),
            Self::Le => ord.is_le(),
            Self::Gt => ord.is_gt(),
            Self::Ge => ord.is_ge(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    NonNull,
    Alu(AluOp),
    Search { threshold: u8 },
}

// ---------------------------------------------------------------------------
// Template + target
// ---------------------------------------------------------------------------

/// `[length][code][mask?][value]`.  Non-null queries carry no token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTemplate {
    pub length: u8,
    pub code: u8,
    /// All `0xFF` for maskless queries.
    pub mask: Vec<u8, MAX_TOKEN>,
    pub value: Vec<u8, MAX_TOKEN>,
}

impl QueryTemplate {
    pub fn parse(q: &mut FrameQueue) -> Result<Self, QueueError> {
        let length = q.read_byte()?;
        let code = q.read_byte()?;
        let mut tmpl = Self {
            length,
            code,
            ..Self::default()
        };
        if code & code::TYPE == code::NON_NULL {
            return Ok(tmpl);
        }

        let n = usize::from(length);
        if n > MAX_TOKEN {
            return Err(QueueError::Capacity);
        }
        if code & code::MASK != 0 {
            tmpl.mask
                .extend_from_slice(q.read_bytes(n)?)
                .map_err(|()| QueueError::Capacity)?;
        } else {
            tmpl.mask.resize(n, 0xFF).map_err(|()| QueueError::Capacity)?;
        }
        tmpl.value
            .extend_from_slice(q.read_bytes(n)?)
            .map_err(|()| QueueError::Capacity)?;
        Ok(tmpl)
    }

    pub fn kind(&self) -> Option<QueryKind> {
        let param = self.code & code::PARAM;
        match self.code & code::TYPE {
            code::NON_NULL => Some(QueryKind::NonNull),
            code::ALU => AluOp::from_param(param).map(QueryKind::Alu),
            code::STRING => Some(QueryKind::Search { threshold: param }),
            _ => None,
        }
    }
}

/// Addressed data element: one file or an ordered series, plus a start
/// offset into the concatenated data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTarget {
    pub is_series: bool,
    pub ids: Vec<u8, MAX_SERIES>,
    pub offset: u16,
}

impl QueryTarget {
    pub fn file(id: u8, offset: u8) -> Self {
        let mut ids = Vec::new();
        // Capacity is at least one.
        let _ = ids.push(id);
        Self {
            is_series: false,
            ids,
            offset: u16::from(offset),
        }
    }

    /// File: `[id][offset:1]`.  Series: `[count][ids][offset:2]`.
    pub fn parse(q: &mut FrameQueue, is_series: bool) -> Result<Self, QueueError> {
        if !is_series {
            let id = q.read_byte()?;
            let offset = q.read_byte()?;
            return Ok(Self::file(id, offset));
        }
        let count = usize::from(q.read_byte()?);
        if count > MAX_SERIES {
            return Err(QueueError::Capacity);
        }
        let mut ids = Vec::new();
        ids.extend_from_slice(q.read_bytes(count)?)
            .map_err(|()| QueueError::Capacity)?;
        let offset = q.read_short()?;
        Ok(Self {
            is_series: true,
            ids,
            offset,
        })
    }

    /// IDs that take part: a single file ignores any extras.
    pub fn files(&self) -> &[u8] {
        if self.is_series {
            &self.ids
        } else {
            self.ids.get(..1).unwrap_or(&[])
        }
    }
}

// ---------------------------------------------------------------------------
// File streaming
// ---------------------------------------------------------------------------

/// Open `id` read-only and confirm `user` may read it.
pub(crate) fn open_readable(
    fs: &mut dyn FilePort,
    auth: &dyn AuthPort,
    id: u8,
    user: UserId,
) -> Result<FileHandle, VlError> {
    let fp = fs.open(id, Access::Read, user)?;
    if !auth.auth_check(fs.modifiers(fp), Access::Read.req_mod(), user) {
        fs.close(fp);
        return Err(VlError::AccessDenied);
    }
    Ok(fp)
}

/// `m2qp_load_isf`: stream up to `window` bytes of the concatenated
/// files in `ids`, starting `offset` bytes in, through `load_fn`.
///
/// `load_fn` returning `false` stops the stream early.  Returns the byte
/// count delivered, or [`SCORE_FILE_ERROR`] if any open or read fails.
pub fn load_isf(
    is_series: bool,
    ids: &[u8],
    offset: u16,
    window: usize,
    load_fn: &mut dyn FnMut(u8) -> bool,
    user: UserId,
    fs: &mut dyn FilePort,
    auth: &dyn AuthPort,
) -> i16 {
    let ids = if is_series { ids } else { ids.get(..1).unwrap_or(&[]) };
    if ids.is_empty() {
        return SCORE_FILE_ERROR;
    }

    let mut skip = u32::from(offset);
    let mut remaining = window;
    let mut loaded = 0usize;

    for &id in ids {
        if remaining == 0 {
            break;
        }
        let fp = match open_readable(fs, auth, id, user) {
            Ok(fp) => fp,
            Err(e) => {
                warn!("m2qp: isf {:#04x} open failed: {}", id, e);
                return SCORE_FILE_ERROR;
            }
        };
        let len = u32::from(fs.length(fp));
        if skip >= len {
            skip -= len;
            fs.close(fp);
            continue;
        }

        let mut pos = skip;
        skip = 0;
        while pos < len && remaining > 0 {
            let byte = match read_byte(fs, fp, pos as u16) {
                Ok(b) => b,
                Err(e) => {
                    warn!("m2qp: isf {:#04x} read at {} failed: {}", id, pos, e);
                    fs.close(fp);
                    return SCORE_FILE_ERROR;
                }
            };
            if !load_fn(byte) {
                remaining = 0;
                break;
            }
            pos += 1;
            remaining -= 1;
            loaded += 1;
        }
        fs.close(fp);
    }
    loaded.min(i16::MAX as usize) as i16
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// `m2qp_isf_comp`: run `tmpl` against the data at `target`.
pub fn isf_comp(
    tmpl: &QueryTemplate,
    target: &QueryTarget,
    user: UserId,
    fs: &mut dyn FilePort,
    auth: &dyn AuthPort,
) -> i16 {
    let Some(kind) = tmpl.kind() else {
        debug!("m2qp: unknown query code {:#04x}", tmpl.code);
        return -1;
    };
    let window = match kind {
        QueryKind::Search { .. } => SEARCH_WINDOW,
        QueryKind::NonNull | QueryKind::Alu(_) => usize::from(tmpl.length),
    };

    let mut scratch: Vec<u8, SEARCH_WINDOW> = Vec::new();
    let loaded = load_isf(
        target.is_series,
        &target.ids,
        target.offset,
        window,
        &mut |b| scratch.push(b).is_ok(),
        user,
        fs,
        auth,
    );
    if loaded < 0 {
        return loaded;
    }

    match kind {
        QueryKind::NonNull => {
            if scratch.len() >= usize::from(tmpl.length) {
                0
            } else {
                -1
            }
        }
        QueryKind::Alu(op) => alu_compare(op, tmpl, &scratch),
        QueryKind::Search { threshold } => string_search(tmpl, &scratch, threshold),
    }
}

/// Masked lexicographic compare; the first differing byte decides.
fn alu_compare(op: AluOp, tmpl: &QueryTemplate, data: &[u8]) -> i16 {
    if data.len() < tmpl.value.len() {
        return -1;
    }
    let ord = data
        .iter()
        .zip(&tmpl.value)
        .zip(&tmpl.mask)
        .map(|((d, v), m)| (d & m).cmp(&(v & m)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal);
    if op.holds(ord) { 0 } else { -1 }
}

/// Bipolar correlation of the token over every alignment in `data`.
fn string_search(tmpl: &QueryTemplate, data: &[u8], threshold: u8) -> i16 {
    let n = tmpl.value.len();
    if n == 0 || data.len() < n {
        return -1;
    }
    let best = data
        .windows(n)
        .map(|w| {
            w.iter()
                .zip(&tmpl.value)
                .zip(&tmpl.mask)
                .map(|((d, v), m)| if d & m == v & m { 1i16 } else { -1 })
                .sum::<i16>()
        })
        .max()
        .unwrap_or(-1);
    if best >= i16::from(threshold) { best } else { -1 }
}
