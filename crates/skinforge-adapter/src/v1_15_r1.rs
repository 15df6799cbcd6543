//! Protocol revision `v1_15_R1`.
//!
//! Respawn still uses the numeric dimension id and a level-type string.
//! The respawn makes the client forget its permission level, so the
//! sequence ends with entity status 28 (op level 4) before the ability
//! resync. It also leaves the open window stale, so the window items are
//! resent last.

use skinforge_protocol::{ClientboundPacket, OP_LEVEL_4_STATUS, PlayerUuid};
use skinforge_world::{LevelInfo, ServerPlayer, World};

use crate::{VersionAdapter, VisibilityRefresher};

/// Adapter for 1.15 servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct V1_15R1;

impl V1_15R1 {
    pub const REVISION: &'static str = "v1_15_R1";

    const REFRESHER: VisibilityRefresher =
        VisibilityRefresher::new(respawn)
            .with_entity_status(OP_LEVEL_4_STATUS)
            .with_inventory_resync();
}

fn respawn(player: &ServerPlayer, level: &LevelInfo) -> ClientboundPacket {
    ClientboundPacket::LegacyRespawn {
        dimension: level.dimension.legacy_id(),
        hashed_seed: level.hashed_seed,
        level_type: level.level_type.clone(),
        game_mode: player.game_mode,
    }
}

impl VersionAdapter for V1_15R1 {
    fn revision(&self) -> &'static str {
        Self::REVISION
    }

    fn refresh_skin(&self, world: &mut World, target: PlayerUuid) {
        Self::REFRESHER.refresh(world, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinforge_protocol::{Dimension, GameMode};
    use skinforge_world::JoinRequest;

    #[test]
    fn test_respawn_uses_legacy_dimension_and_level_type() {
        let mut world = World::new("org.bukkit.craftbukkit.v1_15_R1");
        let mut level = LevelInfo::new("world_nether", Dimension::Nether);
        level.level_type = "flat".into();
        world.add_level(level.clone());

        let uuid = PlayerUuid::random();
        let mut request = JoinRequest::new(uuid, "Notch").game_mode(GameMode::Adventure);
        request.location.level = "world_nether".into();
        let _rx = world.join(request).unwrap();

        let packet = respawn(world.player(uuid).unwrap(), &level);
        assert_eq!(
            packet,
            ClientboundPacket::LegacyRespawn {
                dimension: -1,
                hashed_seed: 0,
                level_type: "flat".into(),
                game_mode: GameMode::Adventure,
            }
        );
    }
}
