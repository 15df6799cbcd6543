//! Protocol-revision adapters for live skin changes.
//!
//! Every Minecraft protocol revision builds its packets differently, so
//! each revision gets one [`VersionAdapter`] implementation. Exactly one
//! adapter is active per process: the [`AdapterRegistry`] picks it once at
//! startup from the server's [`ProtocolVersionTag`].
//!
//! # What an adapter does
//!
//! 1. **Read** the skin currently on a player's live game profile
//!    ([`VersionAdapter::get_skin`]).
//! 2. **Write** a new skin into that profile ([`VersionAdapter::apply_skin`]).
//!    This only changes server state; no client notices yet.
//! 3. **Refresh** ([`VersionAdapter::refresh_skin`]): resend the player to
//!    everyone, themselves included, so clients drop their cached skin and
//!    fetch the new one. The packet choreography lives in
//!    [`VisibilityRefresher`]; adapters only supply the revision-specific
//!    respawn packet and optional trailing status.
//!
//! All three take the world (or a player in it) by reference, so they run
//! on the game loop. Off-loop callers wrap them in one
//! `MainThread::run_task` closure.

mod error;
mod refresh;
mod registry;
mod v1_15_r1;
mod v1_16_r1;

pub use error::AdapterError;
pub use refresh::{RespawnBuilder, VisibilityRefresher};
pub use registry::{AdapterFactory, AdapterRegistry, ProtocolVersionTag};
pub use v1_15_r1::V1_15R1;
pub use v1_16_r1::V1_16R1;

use skinforge_protocol::{PlayerUuid, ProfileProperty, Skin, TEXTURES_PROPERTY};
use skinforge_world::{ServerPlayer, World};

/// Skin operations for one protocol revision.
///
/// `get_skin` and `apply_skin` only touch the game profile, which looks the
/// same in every supported revision, so they have default implementations.
/// `refresh_skin` is where revisions differ.
pub trait VersionAdapter: Send + Sync + 'static {
    /// The revision tag this adapter was built for, e.g. `v1_16_R1`.
    fn revision(&self) -> &'static str;

    /// The skin on the player's live profile, or `None` if it has no
    /// `textures` property.
    fn get_skin(&self, player: &ServerPlayer) -> Option<Skin> {
        let property = player.profile().properties.first(TEXTURES_PROPERTY)?;
        Some(Skin::new(
            property.value.clone(),
            property.signature.clone().unwrap_or_default(),
        ))
    }

    /// Replaces the profile's `textures` property.
    ///
    /// Every existing `textures` entry is removed first, so at most one is
    /// ever present. `None` leaves the profile without one.
    fn apply_skin(&self, player: &mut ServerPlayer, skin: Option<&Skin>) {
        let properties = &mut player.profile_mut().properties;
        properties.remove_all(TEXTURES_PROPERTY);
        if let Some(skin) = skin {
            let signature = skin.signature();
            properties.put(ProfileProperty {
                name: TEXTURES_PROPERTY.into(),
                value: skin.value().into(),
                signature: (!signature.is_empty()).then(|| signature.into()),
            });
        }
    }

    /// Makes every client, including the target's own, re-fetch the
    /// target's skin. Returns silently if the target is offline.
    fn refresh_skin(&self, world: &mut World, target: PlayerUuid);
}
