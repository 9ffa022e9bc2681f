//! Domain-specific error types for the LLRP client.
//!
//! All fallible operations return `Result<T, LlrpError>`.
//! No panics on invalid input. Every error is typed and recoverable.

use thiserror::Error;

/// The canonical error type for the LLRP client.
#[derive(Debug, Error)]
pub enum LlrpError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// A field in the message header could not be parsed.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// The protocol version carried by the reader is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// A TV-encoded parameter whose fixed length is not known.
    #[error("unknown TV parameter type: {0}")]
    UnknownTvParameter(u8),

    /// A parameter ran past the end of its enclosing block.
    #[error("truncated {context}: need {needed} bytes, have {available}")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    // ── Framing Errors ───────────────────────────────────────────
    /// The length field of a message is smaller than its header.
    #[error("invalid message length: {0}")]
    InvalidLength(u32),

    /// Frame size exceeded the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The reader closed the TCP connection.
    #[error("connection closed by reader")]
    PeerClosed,
}
