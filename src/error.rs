//! Unified error types for the Mode-2 engine.
//!
//! A single `Error` enum that every subsystem converts into, so the DLL
//! dispatcher (the only place that turns a failure into a side effect)
//! handles errors uniformly.  All variants are `Copy` so they can be
//! passed through the pipeline without allocation.
//!
//! Protocol-level rejections (bad dialog ID, failed query) are NOT
//! errors here: they travel as negative `i16` scores, see [`crate::m2qp`].

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A frame queue cursor ran past its bounds.
    Queue(QueueError),
    /// A frame could not be built or parsed.
    Frame(FrameError),
    /// The session collection rejected an operation.
    Session(SessionError),
    /// The radio driver reported a failure.
    Radio(RadioError),
    /// The file-system collaborator rejected an access.
    File(VlError),
    /// Configuration is invalid or could not be decoded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::File(e) => write!(f, "file: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// A write would pass the back limit.  Nothing was written.
    Full,
    /// A read would pass the written data.
    Underrun,
    /// A requested limit exceeds the backing storage.
    Capacity,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "queue full"),
            Self::Underrun => write!(f, "read past end of data"),
            Self::Capacity => write!(f, "limit exceeds capacity"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// DLLS and NLS were both requested on one frame.
    SecurityConflict,
    /// A secured frame was requested but no security port is installed.
    NoSecurity,
    /// The security port refused to transform the payload.
    SecurityFailed,
    /// The staged frame does not fit.
    Overflow(QueueError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecurityConflict => write!(f, "DLLS and NLS are mutually exclusive"),
            Self::NoSecurity => write!(f, "secured frame without security port"),
            Self::SecurityFailed => write!(f, "security transform failed"),
            Self::Overflow(e) => write!(f, "overflow ({e})"),
        }
    }
}

impl From<QueueError> for FrameError {
    fn from(e: QueueError) -> Self {
        Self::Overflow(e)
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The collection is at capacity; the newest request was rejected.
    Full,
    /// No session is scheduled.
    Empty,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "session stack full"),
            Self::Empty => write!(f, "no session scheduled"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The driver is busy with another operation.
    Busy,
    /// The requested channel is not supported.
    BadChannel,
    /// The driver failed for a hardware reason.
    Hardware,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "radio busy"),
            Self::BadChannel => write!(f, "unsupported channel"),
            Self::Hardware => write!(f, "hardware failure"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// File-system (Veelite) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlError {
    /// No file with that ID exists.
    NotFound,
    /// The user lacks the requested access.
    AccessDenied,
    /// Offset past the end of the file.
    OutOfRange,
    /// Too many files are open.
    NoHandle,
}

impl fmt::Display for VlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::OutOfRange => write!(f, "offset out of range"),
            Self::NoHandle => write!(f, "no free file handle"),
        }
    }
}

impl From<VlError> for Error {
    fn from(e: VlError) -> Self {
        Self::File(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored blob failed to deserialize.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
