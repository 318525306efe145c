use thiserror::Error;

use crate::session::SessionState;

/// Result type used across this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An unpack needed more bytes than the buffer holds (malformed or truncated frame).
    #[error("buffer too short: need {needed} bytes at offset {offset}, have {available}")]
    BufferTooShort {
        /// Offset the read started at.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Total length of the buffer.
        available: usize,
    },

    /// The session header could not be unpacked.
    #[error("unpack session header failed: {0}")]
    SessionHeader(#[source] Box<Error>),

    /// The session trailer could not be unpacked.
    #[error("unpack session trailer failed: {0}")]
    SessionTrailer(#[source] Box<Error>),

    /// Peer sent a frame with an unexpected or invalid field.
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// Authentication or integrity verification failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(&'static str),

    /// Cryptographic failure (invalid key sizes, decrypt failure, etc.).
    #[error("crypto error: {0}")]
    Crypto(&'static str),

    /// Invalid caller-supplied argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A session state transition was attempted out of order.
    #[error("invalid session state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        /// State the transition requires.
        expected: SessionState,
        /// State the session was actually in.
        actual: SessionState,
    },
}

impl Error {
    /// Whether this error originates from a short buffer, looking through wrapping errors.
    pub fn is_buffer_too_short(&self) -> bool {
        match self {
            Self::BufferTooShort { .. } => true,
            Self::SessionHeader(inner) | Self::SessionTrailer(inner) => inner.is_buffer_too_short(),
            _ => false,
        }
    }

    pub(crate) fn header(err: Error) -> Self {
        Self::SessionHeader(Box::new(err))
    }

    pub(crate) fn trailer(err: Error) -> Self {
        Self::SessionTrailer(Box::new(err))
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::BufferTooShort { .. } => "buffer_too_short",
            Self::SessionHeader(_) => "session_header",
            Self::SessionTrailer(_) => "session_trailer",
            Self::Protocol(_) => "protocol",
            Self::AuthenticationFailed(_) => "authentication",
            Self::Crypto(_) => "crypto",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidState { .. } => "invalid_state",
        }
    }
}
