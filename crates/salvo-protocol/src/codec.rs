//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust values and bytes. The battleship wire
//! format is JSON all the way down (the envelope is JSON and its `data`
//! field is JSON again, stored as a string), but the message layer only
//! talks to the [`Codec`] trait so tests and tools can swap in their own.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because the codec lives inside the
/// coordinator task for the whole lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Serializes a value into a `String`.
    ///
    /// Envelopes carry their payload as a string, so the encoded payload
    /// must be valid UTF-8.
    fn encode_string<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        String::from_utf8(self.encode(value)?).map_err(|e| {
            ProtocolError::InvalidMessage(format!(
                "encoded payload is not UTF-8: {e}"
            ))
        })
    }
}

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature (enabled by default).
///
/// ```rust
/// use salvo_protocol::{Codec, JsonCodec, Position};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Position { x: 2, y: 4 }).unwrap();
/// assert_eq!(bytes, br#"{"x":2,"y":4}"#);
///
/// let back: Position = codec.decode(&bytes).unwrap();
/// assert_eq!(back, Position { x: 2, y: 4 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_string<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        // serde_json can produce a String directly, skipping the UTF-8
        // re-check of the default implementation.
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}
