//! `SkinsPlugin`: startup and shutdown.
//!
//! Enabling the plugin ties every layer together:
//!
//! ```text
//! SkinsConfig ──► adapter select ──► storage open ──► relay bind
//!                                                        │
//!        World ──► GameLoop ──► SkinsApi ◄── Messenger ◄─┘
//!                                  ▲
//!                           PlayerListener
//! ```
//!
//! The fallible steps all run before anything is spawned, so a failed
//! `enable` leaves no tasks behind.

use std::net::SocketAddr;
use std::sync::Arc;

use skinforge_adapter::{AdapterRegistry, ProtocolVersionTag};
use skinforge_session::{DefaultSkinProvider, LoginProfiles};
use skinforge_tick::RepeatingTask;
use skinforge_transport::WebSocketTransport;
use skinforge_world::{GameLoop, MainThread, World, WorldError};
use tokio::task::JoinHandle;

use crate::SkinsError;
use crate::api::SkinsApi;
use crate::config::SkinsConfig;
use crate::hash::SkinHashCache;
use crate::listener::PlayerListener;
use crate::messenger::Messenger;
use crate::source::{NoSkinSource, SkinSource};
use crate::storage::StorageBackend;

/// Builder for [`SkinsPlugin`].
///
/// # Example
///
/// ```rust,no_run
/// use skinforge::prelude::*;
///
/// # async fn run() -> Result<(), SkinsError> {
/// let mut world = World::new("org.bukkit.craftbukkit.v1_16_R1");
/// world.add_level(LevelInfo::new("world", Dimension::Overworld));
///
/// let plugin = SkinsPlugin::builder(SkinsConfig::default())
///     .enable(world)
///     .await?;
/// # let _ = plugin;
/// # Ok(())
/// # }
/// ```
pub struct SkinsPluginBuilder<P, K> {
    config: SkinsConfig,
    profiles: P,
    source: K,
    adapters: AdapterRegistry,
}

impl<P, K> SkinsPluginBuilder<P, K>
where
    P: DefaultSkinProvider,
    K: SkinSource,
{
    /// Replaces the default-skin provider ([`LoginProfiles`] by default).
    pub fn profiles<P2: DefaultSkinProvider>(self, profiles: P2) -> SkinsPluginBuilder<P2, K> {
        SkinsPluginBuilder {
            config: self.config,
            profiles,
            source: self.source,
            adapters: self.adapters,
        }
    }

    /// Replaces the skin source ([`NoSkinSource`] by default).
    pub fn source<K2: SkinSource>(self, source: K2) -> SkinsPluginBuilder<P, K2> {
        SkinsPluginBuilder {
            config: self.config,
            profiles: self.profiles,
            source,
            adapters: self.adapters,
        }
    }

    /// Replaces the adapter registry ([`AdapterRegistry::with_defaults`]
    /// by default).
    pub fn adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    /// Starts the plugin on `world`.
    ///
    /// # Errors
    /// - [`SkinsError::UnsupportedProtocolVersion`] if no adapter matches
    ///   the server's revision
    /// - [`SkinsError::StorageUnavailable`] if the configured storage
    ///   can't be opened
    /// - [`SkinsError::Transport`] if the relay address can't be bound
    pub async fn enable(self, world: World) -> Result<SkinsPlugin<P, K>, SkinsError> {
        let config = self.config.validated();

        let tag = match &config.protocol_version {
            Some(forced) => ProtocolVersionTag::new(forced.clone()),
            None => ProtocolVersionTag::from_package_name(world.server_package()),
        };
        let adapter = self.adapters.select(&tag).inspect_err(|e| {
            tracing::error!(error = %e, "skinforge cannot run on this server version, disabling");
        })?;

        let storage = StorageBackend::open(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "skinforge storage could not be opened, disabling");
            SkinsError::StorageUnavailable(e)
        })?;

        let transport = match &config.relay.bind {
            Some(addr) => Some(WebSocketTransport::bind(addr).await.inspect_err(|e| {
                tracing::error!(%addr, error = %e, "skinforge relay could not bind, disabling");
            })?),
            None => None,
        };

        let (main, game_loop) = GameLoop::spawn(world, config.game_loop());

        let hashes = Arc::new(SkinHashCache::new(config.hash_ttl()));
        let sweeper = {
            let hashes = Arc::clone(&hashes);
            RepeatingTask::spawn("skin-hash-sweep", config.hash_sweep_interval(), move || {
                hashes.sweep();
            })
        };

        let api = SkinsApi::new(storage, self.profiles, self.source, adapter, main.clone(), hashes);

        let relay = transport.map(|transport| {
            let addr = transport.local_addr().ok();
            let messenger = Messenger::new(api.clone());
            RelayServer {
                addr,
                task: tokio::spawn(messenger.serve(transport)),
            }
        });

        tracing::info!(
            revision = %tag,
            relay = ?relay.as_ref().and_then(|r| r.addr),
            "skinforge enabled"
        );

        Ok(SkinsPlugin {
            listener: PlayerListener::new(api.clone()),
            api,
            main,
            game_loop,
            sweeper,
            relay,
        })
    }
}

struct RelayServer {
    addr: Option<SocketAddr>,
    task: JoinHandle<()>,
}

/// A running skin service.
pub struct SkinsPlugin<P = LoginProfiles, K = NoSkinSource> {
    api: SkinsApi<StorageBackend, P, K>,
    listener: PlayerListener<StorageBackend, P, K>,
    main: MainThread,
    game_loop: JoinHandle<World>,
    sweeper: RepeatingTask,
    relay: Option<RelayServer>,
}

impl SkinsPlugin {
    /// A builder with [`LoginProfiles`], [`NoSkinSource`] and the default
    /// adapters.
    pub fn builder(config: SkinsConfig) -> SkinsPluginBuilder<LoginProfiles, NoSkinSource> {
        SkinsPluginBuilder {
            config,
            profiles: LoginProfiles::new(),
            source: NoSkinSource,
            adapters: AdapterRegistry::with_defaults(),
        }
    }
}

impl<P, K> SkinsPlugin<P, K>
where
    P: DefaultSkinProvider,
    K: SkinSource,
{
    pub fn api(&self) -> &SkinsApi<StorageBackend, P, K> {
        &self.api
    }

    /// Join/quit hooks for the host server.
    pub fn listener(&self) -> &PlayerListener<StorageBackend, P, K> {
        &self.listener
    }

    pub fn main_thread(&self) -> &MainThread {
        &self.main
    }

    /// Where the relay accepts proxy links, if it is enabled.
    pub fn relay_addr(&self) -> Option<SocketAddr> {
        self.relay.as_ref().and_then(|r| r.addr)
    }

    /// Stops the relay and the sweeper, lets the game loop finish its
    /// queued tasks, and hands the world back.
    pub async fn shutdown(self) -> Result<World, SkinsError> {
        if let Some(relay) = &self.relay {
            relay.task.abort();
        }
        self.sweeper.cancel();

        self.main.shutdown().await?;
        let world = self.game_loop.await.map_err(|e| {
            tracing::error!(error = %e, "game loop task failed");
            WorldError::Unavailable
        })?;

        tracing::info!("skinforge disabled");
        Ok(world)
    }
}
