//! Clientbound game packets involved in a live skin refresh.
//!
//! These are not a full Minecraft protocol, only the packets a skin
//! refresh touches, modelled at the level of "what fields does the client
//! receive". Byte-level encoding is the server implementation's job.
//!
//! Two revisions disagree on the respawn packet, so it exists in two
//! shapes ([`ClientboundPacket::LegacyRespawn`] and
//! [`ClientboundPacket::Respawn`]) that both report [`PacketKind::Respawn`].

use serde::{Deserialize, Serialize};

use crate::{EntityId, PlayerUuid};

/// Metadata index of the "displayed skin parts" byte on player entities
/// (1.15 and 1.16 layouts).
pub const SKIN_PARTS_INDEX: u8 = 16;

/// Every skin layer visible: cape, jacket, both sleeves, both pant legs, hat.
pub const ALL_SKIN_PARTS: u8 = 0x7F;

/// Entity status that grants the client op-level-4 UI. Sent by the 1.15
/// refresh so the client's permission-dependent state survives the
/// implicit re-login.
pub const OP_LEVEL_4_STATUS: i8 = 28;

/// Window id of the player's own inventory.
pub const PLAYER_INVENTORY_WINDOW: u8 = 0;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A game-profile property as the client sees it in a player-info packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// A player's game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    /// Numeric id used on the wire.
    pub fn id(self) -> u8 {
        match self {
            Self::Survival => 0,
            Self::Creative => 1,
            Self::Adventure => 2,
            Self::Spectator => 3,
        }
    }
}

/// The vanilla dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Pre-1.16 numeric dimension id.
    pub fn legacy_id(self) -> i32 {
        match self {
            Self::Nether => -1,
            Self::Overworld => 0,
            Self::End => 1,
        }
    }

    /// 1.16+ dimension-type registry key.
    pub fn type_key(self) -> &'static str {
        match self {
            Self::Overworld => "minecraft:overworld",
            Self::Nether => "minecraft:the_nether",
            Self::End => "minecraft:the_end",
        }
    }
}

/// Whether a player-info packet adds or removes tab-list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerInfoAction {
    AddPlayer,
    RemovePlayer,
}

/// One player entry in a player-info packet.
///
/// For `RemovePlayer` only `uuid` is read by the client; the remaining
/// fields are still filled in so the packet can be built from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfoEntry {
    pub uuid: PlayerUuid,
    pub name: String,
    /// The profile properties. `textures` travels here.
    pub properties: Vec<ProfileProperty>,
    pub game_mode: GameMode,
    pub latency_ms: i32,
}

impl PlayerInfoEntry {
    /// The `textures` property, if the entry carries one.
    pub fn textures(&self) -> Option<&ProfileProperty> {
        self.properties
            .iter()
            .find(|p| p.name == crate::TEXTURES_PROPERTY)
    }
}

/// A typed entity-metadata value. Only the types a skin refresh writes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    Byte(u8),
    Float(f32),
}

/// The contents of one inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Namespaced item id, e.g. `minecraft:stone`.
    pub item: String,
    pub count: u8,
}

/// One `(index, value)` pair of an entity-metadata packet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

// ---------------------------------------------------------------------------
// ClientboundPacket
// ---------------------------------------------------------------------------

/// A packet sent from the server to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientboundPacket {
    /// Adds or removes tab-list entries (and the skin the client caches).
    PlayerInfo {
        action: PlayerInfoAction,
        entries: Vec<PlayerInfoEntry>,
    },

    /// Despawns entities on the client.
    DestroyEntities { entity_ids: Vec<EntityId> },

    /// Spawns another player's entity. The client looks up the skin from the
    /// player-info entry with the same UUID.
    SpawnPlayer {
        entity_id: EntityId,
        uuid: PlayerUuid,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
    },

    /// 1.15 respawn: numeric dimension plus level type.
    LegacyRespawn {
        dimension: i32,
        hashed_seed: i64,
        level_type: String,
        game_mode: GameMode,
    },

    /// 1.16 respawn: registry keys plus previous game mode and world flags.
    Respawn {
        dimension_type: String,
        world_key: String,
        hashed_seed: i64,
        game_mode: GameMode,
        previous_game_mode: GameMode,
        debug: bool,
        flat: bool,
        copy_metadata: bool,
    },

    /// Teleports the receiving client's own player.
    PlayerPosition {
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        /// Bitmask of relative axes; 0 means every field is absolute.
        relative_flags: u8,
        teleport_id: i32,
    },

    /// Selects the receiving client's hotbar slot (0–8).
    HeldItemSlot { slot: u8 },

    /// Updates entity metadata.
    EntityMetadata {
        entity_id: EntityId,
        entries: Vec<MetadataEntry>,
    },

    /// Triggers an entity status effect.
    EntityStatus { entity_id: EntityId, status: i8 },

    /// Resyncs the receiving client's abilities (flying etc.).
    PlayerAbilities {
        flags: u8,
        flying_speed: f32,
        walking_speed: f32,
    },

    /// Resyncs the receiving client's health bar.
    UpdateHealth {
        health: f32,
        food: i32,
        saturation: f32,
    },

    /// Replaces every slot of a window on the receiving client.
    WindowItems {
        window_id: u8,
        slots: Vec<Option<ItemStack>>,
    },
}

/// The kind of a [`ClientboundPacket`], ignoring its fields.
///
/// Player-info is split by action because the refresh protocol orders the
/// two actions relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    PlayerInfoRemove,
    PlayerInfoAdd,
    DestroyEntities,
    SpawnPlayer,
    Respawn,
    PlayerPosition,
    HeldItemSlot,
    EntityMetadata,
    EntityStatus,
    PlayerAbilities,
    UpdateHealth,
    WindowItems,
}

impl ClientboundPacket {
    /// Returns the packet's kind.
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::PlayerInfo {
                action: PlayerInfoAction::RemovePlayer,
                ..
            } => PacketKind::PlayerInfoRemove,
            Self::PlayerInfo {
                action: PlayerInfoAction::AddPlayer,
                ..
            } => PacketKind::PlayerInfoAdd,
            Self::DestroyEntities { .. } => PacketKind::DestroyEntities,
            Self::SpawnPlayer { .. } => PacketKind::SpawnPlayer,
            Self::LegacyRespawn { .. } | Self::Respawn { .. } => PacketKind::Respawn,
            Self::PlayerPosition { .. } => PacketKind::PlayerPosition,
            Self::HeldItemSlot { .. } => PacketKind::HeldItemSlot,
            Self::EntityMetadata { .. } => PacketKind::EntityMetadata,
            Self::EntityStatus { .. } => PacketKind::EntityStatus,
            Self::PlayerAbilities { .. } => PacketKind::PlayerAbilities,
            Self::UpdateHealth { .. } => PacketKind::UpdateHealth,
            Self::WindowItems { .. } => PacketKind::WindowItems,
        }
    }

    /// Builds a metadata packet that forces every skin layer visible.
    pub fn all_skin_parts(entity_id: EntityId) -> Self {
        Self::EntityMetadata {
            entity_id,
            entries: vec![MetadataEntry {
                index: SKIN_PARTS_INDEX,
                value: MetadataValue::Byte(ALL_SKIN_PARTS),
            }],
        }
    }
}
