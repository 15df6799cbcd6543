//! Wire-level vocabulary for Skinforge.
//!
//! Everything in this crate is plain data that crosses a boundary:
//!
//! - **Identity** ([`Skin`], [`SkinModel`], [`PlayerUuid`], [`EntityId`]):
//!   what a player looks like and who they are.
//! - **Game packets** ([`ClientboundPacket`] and friends): what the backend
//!   sends to a Minecraft client to make a skin change visible.
//! - **Relay messages** ([`RelayMessage`], [`PluginMessage`]): what the proxy
//!   sends to the backend to request a skin change.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how relay messages become
//!   bytes.
//!
//! # Architecture
//!
//! ```text
//! proxy ──RelayMessage──► PluginMessage frame ──► backend
//!                                                   │
//!                                                   ▼
//!                                    ClientboundPacket ──► observers
//! ```
//!
//! Nothing here knows about connections, threads or storage.

mod codec;
mod error;
mod frame;
mod message;
mod packet;
mod skin;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use frame::{MAX_PAYLOAD_SIZE, PluginMessage};
pub use message::{RelayMessage, SKINS_CHANNEL, action};
pub use packet::{
    ALL_SKIN_PARTS, ClientboundPacket, Dimension, GameMode, ItemStack, MetadataEntry,
    MetadataValue, OP_LEVEL_4_STATUS, PLAYER_INVENTORY_WINDOW, PacketKind, PlayerInfoAction,
    PlayerInfoEntry, ProfileProperty, SKIN_PARTS_INDEX,
};
pub use skin::{Skin, SkinModel, TEXTURES_PROPERTY};
pub use types::{EntityId, PlayerUuid};
