//! Error types for the world layer.

use skinforge_protocol::PlayerUuid;

/// Errors that can occur when touching the world or its game loop.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A join named a level that was never added.
    #[error("level '{0}' does not exist")]
    UnknownLevel(String),

    /// A join reused the UUID of a player who is still online.
    #[error("player {0} is already online")]
    AlreadyOnline(PlayerUuid),

    /// The game loop has stopped, or dropped the task before replying.
    #[error("game loop is unavailable")]
    Unavailable,
}
