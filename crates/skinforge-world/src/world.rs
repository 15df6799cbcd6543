//! The world: levels, online players and who can see whom.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use skinforge_protocol::{
    ClientboundPacket, Dimension, EntityId, GameMode, PlayerInfoAction, PlayerUuid, ProfileProperty,
};
use tokio::sync::mpsc;

use crate::{GameProfile, Location, PropertyMap, ServerPlayer, WorldError};

/// Static facts about a level that respawn packets need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub name: String,
    pub dimension: Dimension,
    pub hashed_seed: i64,
    /// Pre-1.16 level type, e.g. `default` or `flat`.
    pub level_type: String,
    /// 1.16+ world registry key, e.g. `minecraft:overworld`.
    pub world_key: String,
    pub debug: bool,
    pub flat: bool,
}

impl LevelInfo {
    /// A non-debug, non-flat level.
    pub fn new(name: impl Into<String>, dimension: Dimension) -> Self {
        let name = name.into();
        Self {
            world_key: format!("minecraft:{}", name.to_lowercase()),
            name,
            dimension,
            hashed_seed: 0,
            level_type: "default".into(),
            debug: false,
            flat: false,
        }
    }
}

/// Everything needed to bring a player online.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub uuid: PlayerUuid,
    pub name: String,
    /// Login profile properties, `textures` included on online-mode servers.
    pub properties: Vec<ProfileProperty>,
    pub location: Location,
    pub game_mode: GameMode,
}

impl JoinRequest {
    /// Joins at the origin of level `world` in survival.
    pub fn new(uuid: PlayerUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            properties: Vec::new(),
            location: Location {
                level: "world".into(),
                x: 0.0,
                y: 64.0,
                z: 0.0,
                yaw: 0.0,
                pitch: 0.0,
            },
            game_mode: GameMode::Survival,
        }
    }

    pub fn with_property(mut self, property: ProfileProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn game_mode(mut self, mode: GameMode) -> Self {
        self.game_mode = mode;
        self
    }
}

/// The running server's state.
///
/// Owned by the [`GameLoop`](crate::GameLoop); see the crate docs for the
/// main-thread rule.
pub struct World {
    server_package: String,
    visibility_toggle: bool,
    levels: HashMap<String, LevelInfo>,
    players: HashMap<PlayerUuid, ServerPlayer>,
    next_entity_id: i32,
}

impl World {
    /// Creates an empty world for a server implementation.
    ///
    /// `server_package` is the implementation's package name, e.g.
    /// `org.bukkit.craftbukkit.v1_16_R1`; its last segment names the
    /// protocol revision.
    pub fn new(server_package: impl Into<String>) -> Self {
        Self {
            server_package: server_package.into(),
            visibility_toggle: true,
            levels: HashMap::new(),
            players: HashMap::new(),
            next_entity_id: 1,
        }
    }

    /// Declares whether the server exposes hide/show as a refresh primitive.
    /// On by default.
    pub fn with_visibility_toggle(mut self, enabled: bool) -> Self {
        self.visibility_toggle = enabled;
        self
    }

    pub fn server_package(&self) -> &str {
        &self.server_package
    }

    pub fn supports_visibility_toggle(&self) -> bool {
        self.visibility_toggle
    }

    // -----------------------------------------------------------------------
    // Levels
    // -----------------------------------------------------------------------

    pub fn add_level(&mut self, level: LevelInfo) {
        self.levels.insert(level.name.clone(), level);
    }

    pub fn level(&self, name: &str) -> Option<&LevelInfo> {
        self.levels.get(name)
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Brings a player online and returns their client's packet stream.
    ///
    /// The newcomer is told about everyone already online, and everyone
    /// already online is told about the newcomer.
    ///
    /// # Errors
    /// - [`WorldError::UnknownLevel`] if the join location's level is missing
    /// - [`WorldError::AlreadyOnline`] if the UUID is taken
    pub fn join(
        &mut self,
        request: JoinRequest,
    ) -> Result<mpsc::UnboundedReceiver<ClientboundPacket>, WorldError> {
        if !self.levels.contains_key(&request.location.level) {
            return Err(WorldError::UnknownLevel(request.location.level));
        }
        if self.players.contains_key(&request.uuid) {
            return Err(WorldError::AlreadyOnline(request.uuid));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let entity_id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;

        let profile = GameProfile {
            id: request.uuid,
            name: request.name,
            properties: request.properties.into_iter().collect::<PropertyMap>(),
        };
        let player = ServerPlayer::new(entity_id, profile, request.location, request.game_mode, tx);

        let newcomer_entry = player.info_entry();
        let newcomer_spawn = player.spawn_packet();
        let mut entries = vec![newcomer_entry.clone()];
        for other in self.players.values() {
            entries.push(other.info_entry());
            other.send(ClientboundPacket::PlayerInfo {
                action: PlayerInfoAction::AddPlayer,
                entries: vec![newcomer_entry.clone()],
            });
            other.send(newcomer_spawn.clone());
        }
        player.send(ClientboundPacket::PlayerInfo {
            action: PlayerInfoAction::AddPlayer,
            entries,
        });
        for other in self.players.values() {
            player.send(other.spawn_packet());
        }

        tracing::info!(
            player = %player.uuid(),
            name = player.name(),
            entity = %entity_id,
            online = self.players.len() + 1,
            "player joined"
        );
        self.players.insert(player.uuid(), player);
        Ok(rx)
    }

    /// Takes a player offline. Everyone else drops them from their tab
    /// list and, if they could see them, despawns the entity.
    pub fn quit(&mut self, uuid: PlayerUuid) -> Option<ServerPlayer> {
        let player = self.players.remove(&uuid)?;
        let entry = player.info_entry();
        for other in self.players.values_mut() {
            other.send(ClientboundPacket::PlayerInfo {
                action: PlayerInfoAction::RemovePlayer,
                entries: vec![entry.clone()],
            });
            if other.can_see(uuid) {
                other.send(ClientboundPacket::DestroyEntities {
                    entity_ids: vec![player.entity_id()],
                });
            }
            other.unhide(uuid);
        }
        tracing::info!(player = %uuid, online = self.players.len(), "player quit");
        Some(player)
    }

    pub fn player(&self, uuid: PlayerUuid) -> Option<&ServerPlayer> {
        self.players.get(&uuid)
    }

    pub fn player_mut(&mut self, uuid: PlayerUuid) -> Option<&mut ServerPlayer> {
        self.players.get_mut(&uuid)
    }

    /// Case-insensitive name lookup.
    pub fn player_by_name(&self, name: &str) -> Option<&ServerPlayer> {
        self.players
            .values()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn is_online(&self, uuid: PlayerUuid) -> bool {
        self.players.contains_key(&uuid)
    }

    pub fn online_players(&self) -> impl Iterator<Item = &ServerPlayer> {
        self.players.values()
    }

    pub fn online_count(&self) -> usize {
        self.players.len()
    }

    /// Whether `observer` currently sees `target`. A player always sees
    /// themselves; offline players see nobody.
    pub fn can_see(&self, observer: PlayerUuid, target: PlayerUuid) -> bool {
        match (self.players.get(&observer), self.players.contains_key(&target)) {
            (Some(obs), true) => observer == target || obs.can_see(target),
            _ => false,
        }
    }

    /// Sends a packet to one player. Returns `false` if they're offline.
    pub fn send_packet(&self, uuid: PlayerUuid, packet: ClientboundPacket) -> bool {
        match self.players.get(&uuid) {
            Some(player) => {
                player.send(packet);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    /// Hides `target` from `observer`: tab-list REMOVE, then despawn.
    ///
    /// Returns `false` (and sends nothing) if either player is offline, they
    /// are the same player, or the target was already hidden.
    pub fn hide_player(&mut self, observer: PlayerUuid, target: PlayerUuid) -> bool {
        if observer == target {
            return false;
        }
        let Some(target_player) = self.players.get(&target) else {
            return false;
        };
        let entry = target_player.info_entry();
        let entity_id = target_player.entity_id();

        let Some(obs) = self.players.get_mut(&observer) else {
            return false;
        };
        if !obs.hide(target) {
            return false;
        }
        obs.send(ClientboundPacket::PlayerInfo {
            action: PlayerInfoAction::RemovePlayer,
            entries: vec![entry],
        });
        obs.send(ClientboundPacket::DestroyEntities {
            entity_ids: vec![entity_id],
        });
        tracing::trace!(%observer, %target, "player hidden");
        true
    }

    /// Shows `target` to `observer` again: tab-list ADD, spawn, metadata.
    ///
    /// Returns `false` (and sends nothing) unless the target was hidden.
    pub fn show_player(&mut self, observer: PlayerUuid, target: PlayerUuid) -> bool {
        if observer == target {
            return false;
        }
        let Some(target_player) = self.players.get(&target) else {
            return false;
        };
        let packets = [
            ClientboundPacket::PlayerInfo {
                action: PlayerInfoAction::AddPlayer,
                entries: vec![target_player.info_entry()],
            },
            target_player.spawn_packet(),
            target_player.metadata_packet(),
        ];

        let Some(obs) = self.players.get_mut(&observer) else {
            return false;
        };
        if !obs.unhide(target) {
            return false;
        }
        for packet in packets {
            obs.send(packet);
        }
        tracing::trace!(%observer, %target, "player shown");
        true
    }
}
