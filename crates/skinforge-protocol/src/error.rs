//! Error types for the protocol layer.
//!
//! Each Skinforge crate defines its own error enum. A `ProtocolError` always
//! means "these bytes or fields are wrong", never "the network is down" or
//! "the player left".

/// Errors that can occur while encoding, decoding or validating wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, an `action` or `player` key that is
    /// missing, or a non-string value in a relay message field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A relay message is missing a field its action requires,
    /// e.g. a `set` without `skin_signature`.
    #[error("action '{action}' requires field '{field}'")]
    MissingField {
        action: String,
        field: &'static str,
    },

    /// A relay message carries a value that parses but makes no sense,
    /// e.g. an unknown skin model.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A plugin-message frame is truncated, oversized, or names a channel
    /// that isn't `namespace:name`.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
