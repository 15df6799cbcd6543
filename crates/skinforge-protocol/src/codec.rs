//! Codec trait and implementations for relay payloads.
//!
//! The relay layer only cares that a [`RelayMessage`](crate::RelayMessage)
//! can be turned into bytes and back. HOW that happens is behind the
//! [`Codec`] trait, so the proxy and the backend agree on one implementation
//! and nothing else has to change if it is swapped.
//!
//! [`JsonCodec`] is the only implementation. Proxies and backends have always
//! spoken JSON on this channel, and JSON keeps the relay traffic readable in
//! logs.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → one codec instance is shared by every relay link task.
/// - `'static` → the codec is stored inside long-lived actors.
///
/// `decode` requires `DeserializeOwned` (not plain `Deserialize`) because
/// the frame buffer is dropped right after decoding; the decoded value must
/// own its strings.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed or truncated input,
    /// or input whose shape doesn't match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use skinforge_protocol::{Codec, JsonCodec, RelayMessage, Skin};
///
/// let codec = JsonCodec;
/// let msg = RelayMessage::set("Alice", &Skin::new("dGV4dHVyZQ==", "c2ln"));
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: RelayMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
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
}
