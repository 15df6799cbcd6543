//! Protocol revisions `v1_16_R1` through `v1_16_R3`.
//!
//! 1.16 replaced the numeric dimension with registry keys and added the
//! previous game mode plus debug/flat flags to respawn. No trailing status
//! packet is needed.

use skinforge_protocol::{ClientboundPacket, PlayerUuid};
use skinforge_world::{LevelInfo, ServerPlayer, World};

use crate::{VersionAdapter, VisibilityRefresher};

/// Adapter for 1.16 servers.
#[derive(Debug, Clone, Copy)]
pub struct V1_16R1 {
    revision: &'static str,
}

impl V1_16R1 {
    pub const REVISION: &'static str = "v1_16_R1";

    const REFRESHER: VisibilityRefresher = VisibilityRefresher::new(respawn);

    pub fn new() -> Self {
        Self::for_revision(Self::REVISION)
    }

    /// The same adapter under a later 1.16 tag (`v1_16_R2`, `v1_16_R3`),
    /// which share the packet layout.
    pub fn for_revision(revision: &'static str) -> Self {
        Self { revision }
    }
}

impl Default for V1_16R1 {
    fn default() -> Self {
        Self::new()
    }
}

fn respawn(player: &ServerPlayer, level: &LevelInfo) -> ClientboundPacket {
    ClientboundPacket::Respawn {
        dimension_type: level.dimension.type_key().into(),
        world_key: level.world_key.clone(),
        hashed_seed: level.hashed_seed,
        game_mode: player.game_mode,
        previous_game_mode: player.previous_game_mode.unwrap_or(player.game_mode),
        debug: level.debug,
        flat: level.flat,
        copy_metadata: true,
    }
}

impl VersionAdapter for V1_16R1 {
    fn revision(&self) -> &'static str {
        self.revision
    }

    fn refresh_skin(&self, world: &mut World, target: PlayerUuid) {
        Self::REFRESHER.refresh(world, target);
    }
}
