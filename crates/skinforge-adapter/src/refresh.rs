//! The packet choreography of a live skin refresh.
//!
//! A client caches a player's skin from the tab-list entry it was given, so
//! the only way to change it live is to remove the player and add them back
//! with new profile properties. The player's own client needs more: it has
//! to "respawn" in place so its local player model is rebuilt, then get its
//! position, hotbar, abilities and health back.
//!
//! ```text
//! observers (can see target)          target's own client
//! ─────────────────────────           ───────────────────
//! toggle:  hide → show                info REMOVE
//!   hide = info REMOVE, destroy       info ADD
//!   show = info ADD, spawn, meta      respawn        (per revision)
//! manual:  destroy                    position
//!          info REMOVE                held slot
//!          info ADD                   metadata (skin parts 0x7F)
//!          spawn                      [entity status] (per revision)
//!          metadata                   abilities
//!                                     health
//!                                     [window items] (per revision)
//! observers (can't see target): info REMOVE, info ADD   (manual only)
//! ```
//!
//! REMOVE always precedes ADD, and metadata always follows respawn.

use skinforge_protocol::{
    ALL_SKIN_PARTS, ClientboundPacket, MetadataValue, PlayerInfoAction, PlayerUuid, SKIN_PARTS_INDEX,
};
use skinforge_world::{LevelInfo, ServerPlayer, World};

/// Builds the revision's respawn packet for a player in a level.
pub type RespawnBuilder = fn(&ServerPlayer, &LevelInfo) -> ClientboundPacket;

/// Every packet a refresh sends, built once from the target's state.
struct RefreshPackets {
    info_remove: ClientboundPacket,
    info_add: ClientboundPacket,
    destroy: ClientboundPacket,
    spawn: ClientboundPacket,
    respawn: ClientboundPacket,
    position: ClientboundPacket,
    held_slot: ClientboundPacket,
    metadata: ClientboundPacket,
    status: Option<ClientboundPacket>,
    abilities: ClientboundPacket,
    health: ClientboundPacket,
    window_items: Option<ClientboundPacket>,
}

/// Re-sends a player to every client that knows about them.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityRefresher {
    respawn: RespawnBuilder,
    entity_status: Option<i8>,
    inventory_resync: bool,
}

impl VisibilityRefresher {
    pub const fn new(respawn: RespawnBuilder) -> Self {
        Self {
            respawn,
            entity_status: None,
            inventory_resync: false,
        }
    }

    /// Appends an entity-status packet to the target's own sequence.
    pub const fn with_entity_status(mut self, status: i8) -> Self {
        self.entity_status = Some(status);
        self
    }

    /// Ends the target's own sequence with the contents of its open window,
    /// for revisions whose respawn leaves the client's inventory view stale.
    pub const fn with_inventory_resync(mut self) -> Self {
        self.inventory_resync = true;
        self
    }

    /// Runs the refresh for `target`.
    ///
    /// Uses the hide/show toggle for observers when the world supports it,
    /// the manual packet path otherwise. Offline targets are a no-op.
    pub fn refresh(&self, world: &mut World, target: PlayerUuid) {
        let Some(packets) = self.build(world, target) else {
            return;
        };

        let observers: Vec<PlayerUuid> = world
            .online_players()
            .map(ServerPlayer::uuid)
            .filter(|&uuid| uuid != target)
            .collect();

        if world.supports_visibility_toggle() {
            for observer in observers {
                if world.can_see(observer, target) {
                    world.hide_player(observer, target);
                    world.show_player(observer, target);
                }
            }
        } else {
            for observer in observers {
                let sequence = if world.can_see(observer, target) {
                    vec![
                        &packets.destroy,
                        &packets.info_remove,
                        &packets.info_add,
                        &packets.spawn,
                        &packets.metadata,
                    ]
                } else {
                    vec![&packets.info_remove, &packets.info_add]
                };
                for packet in sequence {
                    world.send_packet(observer, packet.clone());
                }
            }
        }

        let RefreshPackets {
            info_remove,
            info_add,
            respawn,
            position,
            held_slot,
            metadata,
            status,
            abilities,
            health,
            window_items,
            ..
        } = packets;
        let own = [info_remove, info_add, respawn, position, held_slot, metadata]
            .into_iter()
            .chain(status)
            .chain([abilities, health])
            .chain(window_items);
        for packet in own {
            world.send_packet(target, packet);
        }

        tracing::debug!(player = %target, "skin refreshed");
    }

    /// Forces all skin layers on, then builds every packet from the
    /// target's current state. `None` if the target is offline.
    fn build(&self, world: &mut World, target: PlayerUuid) -> Option<RefreshPackets> {
        let Some(level_name) = world.player(target).map(|p| p.location.level.clone()) else {
            tracing::trace!(player = %target, "refresh target offline, skipping");
            return None;
        };
        let Some(level) = world.level(&level_name).cloned() else {
            tracing::warn!(player = %target, level = %level_name, "refresh target in unknown level, skipping");
            return None;
        };
        let player = world.player_mut(target)?;
        player.set_metadata(SKIN_PARTS_INDEX, MetadataValue::Byte(ALL_SKIN_PARTS));

        let entry = player.info_entry();
        let entity_id = player.entity_id();
        Some(RefreshPackets {
            info_remove: ClientboundPacket::PlayerInfo {
                action: PlayerInfoAction::RemovePlayer,
                entries: vec![entry.clone()],
            },
            info_add: ClientboundPacket::PlayerInfo {
                action: PlayerInfoAction::AddPlayer,
                entries: vec![entry],
            },
            destroy: ClientboundPacket::DestroyEntities {
                entity_ids: vec![entity_id],
            },
            spawn: player.spawn_packet(),
            respawn: (self.respawn)(player, &level),
            position: player.position_packet(),
            held_slot: ClientboundPacket::HeldItemSlot {
                slot: player.held_slot,
            },
            metadata: ClientboundPacket::all_skin_parts(entity_id),
            status: self.entity_status.map(|status| ClientboundPacket::EntityStatus {
                entity_id,
                status,
            }),
            abilities: player.abilities_packet(),
            health: player.health_packet(),
            window_items: self.inventory_resync.then(|| player.window_items_packet()),
        })
    }
}
