//! Error types for the protocol layer.
//!
//! Every protocol error is a "this message is garbage" error. The server
//! never replies to them; it logs and drops the message and keeps the
//! connection open.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong
    /// types, or a payload that does not match its envelope's `type`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope's `type` is not one this side of the protocol accepts.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    /// The message parsed but breaks a protocol rule, e.g. an encoded
    /// payload that is not valid UTF-8.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
