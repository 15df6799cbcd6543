//! Error types for the session layer.

/// Errors raised while resolving a player's session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The login profile source could not answer.
    #[error("profile lookup failed: {0}")]
    ProfileLookup(String),
}
