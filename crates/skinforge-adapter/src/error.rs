//! Error types for adapter selection.

/// Errors that can occur while choosing a version adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// No adapter is registered for the server's protocol revision.
    #[error("unsupported protocol version '{tag}' (supported: {})", .supported.join(", "))]
    UnsupportedProtocolVersion { tag: String, supported: Vec<String> },
}
