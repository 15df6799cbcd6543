//! Unified error type for Skinforge.

use skinforge_adapter::AdapterError;
use skinforge_protocol::ProtocolError;
use skinforge_session::SessionError;
use skinforge_transport::TransportError;
use skinforge_world::WorldError;

use crate::source::SourceError;
use crate::storage::StorageError;

/// Top-level error that wraps every sub-crate error.
///
/// The `#[from]` conversions let `?` lift sub-crate errors. Storage errors
/// map to two variants: [`StorageUnavailable`](Self::StorageUnavailable)
/// is the fatal startup failure, [`Storage`](Self::Storage) a failed
/// per-request read or write.
#[derive(Debug, thiserror::Error)]
pub enum SkinsError {
    /// The target player isn't connected to this backend.
    #[error("player '{0}' is not online")]
    NotOnline(String),

    /// The server's protocol revision has no adapter. Fatal at startup.
    #[error(transparent)]
    UnsupportedProtocolVersion(#[from] AdapterError),

    /// Storage could not be opened. Fatal at startup.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),

    /// A storage read or write failed while handling a request.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A relay message could not be understood.
    #[error("malformed relay message: {0}")]
    MalformedMessage(#[from] ProtocolError),

    /// The skin source had nothing for the given name or image.
    #[error("no skin found for '{0}'")]
    SkinNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
