//! Per-player skin state for Skinforge.
//!
//! Every connected player has a [`PlayerRecord`]: who they are, which custom
//! skin they picked (if any), and the skin their login profile came with.
//! The [`SessionRegistry`] holds one record per connected player for the
//! lifetime of their connection; the persistent copy lives in storage one
//! layer up.
//!
//! # How it fits in the stack
//!
//! ```text
//! SkinsApi (above)        ← locks a PlayerHandle, persists, schedules refresh
//!     ↕
//! Session Layer (this)    ← records, registry, login profiles
//!     ↕
//! Protocol Layer (below)  ← Skin, PlayerUuid
//! ```
//!
//! # Locking
//!
//! Each record sits behind its own `tokio::sync::Mutex` ([`PlayerHandle`]).
//! A record is only mutated while that lock is held, so readers never see
//! a half-applied change. The registry itself is a plain map; the owner
//! wraps it in a mutex for the short add/remove/lookup calls.

mod error;
mod profile;
mod record;
mod registry;

pub use error::SessionError;
pub use profile::{DefaultSkinProvider, LoginProfiles};
pub use record::PlayerRecord;
pub use registry::{PlayerHandle, SessionRegistry};
