//! One online player, as the server sees them.

use std::collections::{BTreeMap, HashSet};

use skinforge_protocol::{
    ClientboundPacket, EntityId, GameMode, ItemStack, MetadataEntry, MetadataValue,
    PLAYER_INVENTORY_WINDOW, PlayerInfoEntry, PlayerUuid, SKIN_PARTS_INDEX,
};
use tokio::sync::mpsc;

use crate::GameProfile;

/// Where a player's clientbound packets go.
///
/// Unbounded so the game loop never waits on a slow client. When the
/// receiving half is gone the player has disconnected and sends are
/// dropped.
pub type PacketSink = mpsc::UnboundedSender<ClientboundPacket>;

/// Slots in a player's own inventory window: crafting grid and result,
/// armor, main inventory, hotbar and offhand.
pub const PLAYER_INVENTORY_SLOTS: usize = 46;

/// Position and orientation inside a level.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub level: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

/// The player-abilities flags and speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Abilities {
    pub invulnerable: bool,
    pub flying: bool,
    pub may_fly: bool,
    pub instabuild: bool,
    pub flying_speed: f32,
    pub walking_speed: f32,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            invulnerable: false,
            flying: false,
            may_fly: false,
            instabuild: false,
            flying_speed: 0.05,
            walking_speed: 0.1,
        }
    }
}

impl Abilities {
    /// Vanilla abilities for a game mode.
    pub fn for_game_mode(mode: GameMode) -> Self {
        let mut abilities = Self::default();
        match mode {
            GameMode::Creative => {
                abilities.invulnerable = true;
                abilities.may_fly = true;
                abilities.instabuild = true;
            }
            GameMode::Spectator => {
                abilities.invulnerable = true;
                abilities.may_fly = true;
                abilities.flying = true;
            }
            GameMode::Survival | GameMode::Adventure => {}
        }
        abilities
    }

    /// Wire bitmask: invulnerable, flying, may fly, instabuild.
    pub fn flags(&self) -> u8 {
        u8::from(self.invulnerable)
            | u8::from(self.flying) << 1
            | u8::from(self.may_fly) << 2
            | u8::from(self.instabuild) << 3
    }
}

/// An online player.
///
/// The identity fields are fixed at join; everything else is public state a
/// game server would mutate as the player plays.
#[derive(Debug)]
pub struct ServerPlayer {
    entity_id: EntityId,
    profile: GameProfile,
    pub location: Location,
    pub game_mode: GameMode,
    pub previous_game_mode: Option<GameMode>,
    /// Hotbar slot, 0–8.
    pub held_slot: u8,
    pub health: f32,
    pub food: i32,
    pub saturation: f32,
    pub abilities: Abilities,
    pub dead: bool,
    pub latency_ms: i32,
    /// The window the client has open. [`PLAYER_INVENTORY_WINDOW`] when
    /// no container is open.
    pub open_window: u8,
    /// Slot contents of the open window.
    pub window_slots: Vec<Option<ItemStack>>,
    metadata: BTreeMap<u8, MetadataValue>,
    /// Players this one currently can't see.
    hidden: HashSet<PlayerUuid>,
    next_teleport_id: i32,
    connection: PacketSink,
}

impl ServerPlayer {
    pub(crate) fn new(
        entity_id: EntityId,
        profile: GameProfile,
        location: Location,
        game_mode: GameMode,
        connection: PacketSink,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SKIN_PARTS_INDEX, MetadataValue::Byte(0));
        Self {
            entity_id,
            profile,
            location,
            game_mode,
            previous_game_mode: None,
            held_slot: 0,
            health: 20.0,
            food: 20,
            saturation: 5.0,
            abilities: Abilities::for_game_mode(game_mode),
            dead: false,
            latency_ms: 0,
            open_window: PLAYER_INVENTORY_WINDOW,
            window_slots: vec![None; PLAYER_INVENTORY_SLOTS],
            metadata,
            hidden: HashSet::new(),
            next_teleport_id: 1,
            connection,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn uuid(&self) -> PlayerUuid {
        self.profile.id
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// The live game profile. Its `textures` property is the skin other
    /// clients are told about.
    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut GameProfile {
        &mut self.profile
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Brings a dead player back with full health and hunger.
    pub fn respawn(&mut self) {
        self.dead = false;
        self.health = 20.0;
        self.food = 20;
        self.saturation = 5.0;
    }

    /// Whether this player currently sees `other`.
    pub fn can_see(&self, other: PlayerUuid) -> bool {
        !self.hidden.contains(&other)
    }

    /// Marks `other` hidden. Returns `false` if it already was.
    pub(crate) fn hide(&mut self, other: PlayerUuid) -> bool {
        self.hidden.insert(other)
    }

    /// Marks `other` visible. Returns `false` if it already was.
    pub(crate) fn unhide(&mut self, other: PlayerUuid) -> bool {
        self.hidden.remove(&other)
    }

    pub fn metadata(&self, index: u8) -> Option<MetadataValue> {
        self.metadata.get(&index).copied()
    }

    pub fn set_metadata(&mut self, index: u8, value: MetadataValue) {
        self.metadata.insert(index, value);
    }

    /// Queues a packet for this player's client. Dropped if the client is
    /// gone.
    pub fn send(&self, packet: ClientboundPacket) {
        if self.connection.send(packet).is_err() {
            tracing::trace!(player = %self.profile.id, "connection closed, packet dropped");
        }
    }

    /// Whether the client is still attached.
    pub fn is_connected(&self) -> bool {
        !self.connection.is_closed()
    }

    // -----------------------------------------------------------------------
    // Packet builders
    // -----------------------------------------------------------------------

    /// This player's tab-list entry, carrying the current profile properties.
    pub fn info_entry(&self) -> PlayerInfoEntry {
        PlayerInfoEntry {
            uuid: self.profile.id,
            name: self.profile.name.clone(),
            properties: self.profile.properties.iter().cloned().collect(),
            game_mode: self.game_mode,
            latency_ms: self.latency_ms,
        }
    }

    /// Spawns this player's entity on another client.
    pub fn spawn_packet(&self) -> ClientboundPacket {
        ClientboundPacket::SpawnPlayer {
            entity_id: self.entity_id,
            uuid: self.profile.id,
            x: self.location.x,
            y: self.location.y,
            z: self.location.z,
            yaw: self.location.yaw,
            pitch: self.location.pitch,
        }
    }

    /// Every metadata entry this player currently has.
    pub fn metadata_packet(&self) -> ClientboundPacket {
        ClientboundPacket::EntityMetadata {
            entity_id: self.entity_id,
            entries: self
                .metadata
                .iter()
                .map(|(&index, &value)| MetadataEntry { index, value })
                .collect(),
        }
    }

    /// Absolute teleport to the current location. Each call uses a fresh
    /// teleport id.
    pub fn position_packet(&mut self) -> ClientboundPacket {
        let teleport_id = self.next_teleport_id;
        self.next_teleport_id = self.next_teleport_id.wrapping_add(1);
        ClientboundPacket::PlayerPosition {
            x: self.location.x,
            y: self.location.y,
            z: self.location.z,
            yaw: self.location.yaw,
            pitch: self.location.pitch,
            relative_flags: 0,
            teleport_id,
        }
    }

    pub fn abilities_packet(&self) -> ClientboundPacket {
        ClientboundPacket::PlayerAbilities {
            flags: self.abilities.flags(),
            flying_speed: self.abilities.flying_speed,
            walking_speed: self.abilities.walking_speed,
        }
    }

    pub fn health_packet(&self) -> ClientboundPacket {
        ClientboundPacket::UpdateHealth {
            health: self.health,
            food: self.food,
            saturation: self.saturation,
        }
    }

    /// Every slot of the open window.
    pub fn window_items_packet(&self) -> ClientboundPacket {
        ClientboundPacket::WindowItems {
            window_id: self.open_window,
            slots: self.window_slots.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> (ServerPlayer, mpsc::UnboundedReceiver<ClientboundPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let location = Location {
            level: "world".into(),
            x: 1.5,
            y: 64.0,
            z: -3.25,
            yaw: 90.0,
            pitch: 10.0,
        };
        let profile = GameProfile::new(PlayerUuid::random(), "Notch");
        (
            ServerPlayer::new(EntityId(7), profile, location, GameMode::Survival, tx),
            rx,
        )
    }

    #[test]
    fn test_abilities_flags_creative() {
        let abilities = Abilities::for_game_mode(GameMode::Creative);
        assert_eq!(abilities.flags(), 0b1101);
        assert_eq!(Abilities::for_game_mode(GameMode::Survival).flags(), 0);
    }

    #[test]
    fn test_send_after_disconnect_is_dropped() {
        let (player, rx) = player();
        drop(rx);
        assert!(!player.is_connected());
        player.send(player.health_packet());
    }

    #[test]
    fn test_position_packet_uses_fresh_teleport_ids() {
        let (mut player, _rx) = player();
        let first = player.position_packet();
        let second = player.position_packet();
        match (first, second) {
            (
                ClientboundPacket::PlayerPosition { teleport_id: a, x, .. },
                ClientboundPacket::PlayerPosition { teleport_id: b, .. },
            ) => {
                assert_eq!(x, 1.5);
                assert_ne!(a, b);
            }
            other => panic!("unexpected packets {other:?}"),
        }
    }

    #[test]
    fn test_metadata_packet_carries_all_entries() {
        let (mut player, _rx) = player();
        player.set_metadata(SKIN_PARTS_INDEX, MetadataValue::Byte(0x7F));
        player.set_metadata(9, MetadataValue::Float(20.0));
        let ClientboundPacket::EntityMetadata { entity_id, entries } = player.metadata_packet() else {
            panic!("expected metadata");
        };
        assert_eq!(entity_id, EntityId(7));
        assert_eq!(entries.len(), 2);
        assert_eq!(player.metadata(SKIN_PARTS_INDEX), Some(MetadataValue::Byte(0x7F)));
    }

    #[test]
    fn test_window_items_packet_reflects_open_window() {
        let (mut player, _rx) = player();
        player.window_slots[36] = Some(ItemStack {
            item: "minecraft:stone".into(),
            count: 64,
        });

        let ClientboundPacket::WindowItems { window_id, slots } = player.window_items_packet() else {
            panic!("expected window items");
        };
        assert_eq!(window_id, PLAYER_INVENTORY_WINDOW);
        assert_eq!(slots.len(), PLAYER_INVENTORY_SLOTS);
        assert_eq!(slots[36].as_ref().map(|i| i.count), Some(64));
    }

    #[test]
    fn test_respawn_restores_health() {
        let (mut player, _rx) = player();
        player.dead = true;
        player.health = 0.0;
        player.food = 3;

        player.respawn();

        assert!(!player.is_dead());
        assert_eq!(player.health, 20.0);
        assert_eq!(player.food, 20);
    }

    #[test]
    fn test_can_see_toggles() {
        let (mut player, _rx) = player();
        let other = PlayerUuid::random();
        assert!(player.can_see(other));
        assert!(player.hide(other));
        assert!(!player.hide(other));
        assert!(!player.can_see(other));
        assert!(player.unhide(other));
        assert!(player.can_see(other));
    }
}
