//! Unified error types for the command station.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level wiring's error handling uniform. All variants are `Copy` so they
//! can be cheaply passed between tick contexts without allocation.
//!
//! Nothing in this crate treats an error as fatal: a lighting-protocol or
//! display hiccup must never halt the host device.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the command station funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The event transport rejected or could not accept a send.
    Transport(TransportError),
    /// A request was malformed and rejected synchronously.
    InvalidArgument(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the event transport facade.
///
/// All of these are non-fatal. An in-flight fade segment that fails to send
/// is logged and retried on the next tick; a failed `start()` is surfaced to
/// the caller, who retains the request and may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying bus stack is not up (e.g. still initialising).
    NotReady,
    /// The pacing limit would be violated; retry shortly.
    Throttled,
    /// The bus accepted the frame but transmission failed.
    SendFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "not ready"),
            Self::Throttled => write!(f, "send rate exceeded"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
