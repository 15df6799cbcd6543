//! # Skinforge
//!
//! Live player skin changes for Minecraft servers.
//!
//! A skin change is visible to everyone at once, the changed player
//! included, without a reconnect. Skinforge persists the change, writes it
//! into the player's live game profile, and resends the player to every
//! client with the packet sequence their protocol revision needs. A proxy
//! in front of several backends can request changes over a small relay
//! channel.
//!
//! ## Layers
//!
//! - [`skinforge_protocol`]: skins, game packets, relay messages
//! - [`skinforge_transport`]: WebSocket relay links
//! - [`skinforge_world`]: the game loop and what lives on it
//! - [`skinforge_adapter`]: one [`VersionAdapter`] per protocol revision
//! - [`skinforge_session`]: per-player records and the registry
//! - this crate: [`SkinsApi`], the relay [`Messenger`], storage and startup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skinforge::prelude::*;
//!
//! # async fn run() -> Result<(), SkinsError> {
//! let mut world = World::new("org.bukkit.craftbukkit.v1_16_R1");
//! world.add_level(LevelInfo::new("world", Dimension::Overworld));
//!
//! let plugin = SkinsPlugin::builder(SkinsConfig::default()).enable(world).await?;
//!
//! let joined = plugin.listener().on_join(JoinRequest::new(PlayerUuid::random(), "Notch")).await?;
//! joined.skin_load.await.ok();
//!
//! plugin.api().set_skin(joined.uuid, Skin::new("dGV4dHVyZQ==", "c2ln")).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod error;
mod hash;
mod listener;
mod messenger;
mod plugin;
mod proxy;
mod source;
mod storage;

pub mod logging;

pub use api::{SkinRequest, SkinsApi};
pub use config::{DatabaseConfig, RelayConfig, SkinsConfig};
pub use error::SkinsError;
pub use hash::SkinHashCache;
pub use listener::{JoinedPlayer, PlayerListener};
pub use messenger::{ActionParser, Delivery, Messenger};
pub use plugin::{SkinsPlugin, SkinsPluginBuilder};
pub use proxy::ProxyMessenger;
pub use source::{NoSkinSource, SkinSource, SourceError, StaticSkinSource};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageBackend, StorageError};

pub use skinforge_adapter::VersionAdapter;

pub mod prelude {
    pub use crate::{
        Delivery, JoinedPlayer, Messenger, PlayerListener, ProxyMessenger, SkinRequest, SkinSource,
        SkinsApi, SkinsConfig, SkinsError, SkinsPlugin, StaticSkinSource, Storage,
    };
    pub use skinforge_adapter::{AdapterRegistry, VersionAdapter};
    pub use skinforge_protocol::{
        ClientboundPacket, Dimension, PlayerUuid, RelayMessage, Skin, SkinModel,
    };
    pub use skinforge_session::{DefaultSkinProvider, LoginProfiles, PlayerRecord};
    pub use skinforge_world::{GameLoop, JoinRequest, LevelInfo, MainThread, World};
}
