//! Join and quit hooks.
//!
//! The host server calls [`PlayerListener::on_join`] when a player logs in,
//! [`PlayerListener::on_respawn`] when they come back from death and
//! [`PlayerListener::on_quit`] when they leave. The listener puts the
//! player into the world, kicks off the background record load, and keeps
//! the registry in step with who is actually online.

use skinforge_protocol::{ClientboundPacket, PlayerUuid, Skin, TEXTURES_PROPERTY};
use skinforge_session::DefaultSkinProvider;
use skinforge_world::JoinRequest;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::SkinsError;
use crate::api::SkinsApi;
use crate::source::SkinSource;
use crate::storage::Storage;

/// A player who just joined.
pub struct JoinedPlayer {
    pub uuid: PlayerUuid,
    /// Packets the server sends this player's client.
    pub packets: mpsc::UnboundedReceiver<ClientboundPacket>,
    /// The background record load. Finishes once the record is registered
    /// (or the load gave up).
    pub skin_load: JoinHandle<()>,
}

/// Wires player lifecycle events into the skin service.
pub struct PlayerListener<S, P, K> {
    api: SkinsApi<S, P, K>,
}

impl<S, P, K> Clone for PlayerListener<S, P, K> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<S, P, K> PlayerListener<S, P, K>
where
    S: Storage,
    P: DefaultSkinProvider,
    K: SkinSource,
{
    pub fn new(api: SkinsApi<S, P, K>) -> Self {
        Self { api }
    }

    /// Puts a player into the world and starts loading their record.
    ///
    /// The login `textures` property is handed to the
    /// [`DefaultSkinProvider`] before the load starts, so a reset later on
    /// can restore it.
    ///
    /// # Errors
    /// Whatever [`World::join`](skinforge_world::World::join) rejects, or
    /// [`WorldError::Unavailable`](skinforge_world::WorldError::Unavailable)
    /// if the game loop has stopped.
    pub async fn on_join(&self, request: JoinRequest) -> Result<JoinedPlayer, SkinsError> {
        let uuid = request.uuid;
        let name = request.name.clone();
        let login_skin = login_skin(&request);

        let packets = self
            .api
            .main_thread()
            .call(move |world| world.join(request))
            .await??;

        self.api.profiles().on_login(uuid, login_skin.as_ref());
        tracing::info!(player = %uuid, %name, "player joined");

        let skin_load = self.api.load_on_join(uuid, name);
        Ok(JoinedPlayer {
            uuid,
            packets,
            skin_load,
        })
    }

    /// Respawns a dead player and shows their custom skin again.
    ///
    /// A skin loaded while the player was dead is never refreshed at load
    /// time, so this is where observers first see it. Returns `false` if
    /// the player isn't online or nothing needed refreshing.
    pub async fn on_respawn(&self, uuid: PlayerUuid) -> Result<bool, SkinsError> {
        let online = self
            .api
            .main_thread()
            .call(move |world| match world.player_mut(uuid) {
                Some(player) => {
                    player.respawn();
                    true
                }
                None => false,
            })
            .await?;
        if !online {
            return Ok(false);
        }

        let refreshed = self.api.on_respawn(uuid).await?;
        tracing::debug!(player = %uuid, refreshed, "player respawned");
        Ok(refreshed)
    }

    /// Removes a player from the world and evicts their record.
    ///
    /// Both happen in one main-thread task, so a skin change queued behind
    /// it finds the player gone and does nothing. Returns `false` if the
    /// player wasn't online.
    pub async fn on_quit(&self, uuid: PlayerUuid) -> Result<bool, SkinsError> {
        let api = self.api.clone();
        let was_online = self
            .api
            .main_thread()
            .call(move |world| {
                let was_online = world.quit(uuid).is_some();
                api.on_quit(uuid);
                was_online
            })
            .await?;

        self.api.profiles().on_logout(uuid);
        if was_online {
            tracing::info!(player = %uuid, "player quit");
        }
        Ok(was_online)
    }

    pub fn api(&self) -> &SkinsApi<S, P, K> {
        &self.api
    }
}

/// The signed `textures` property from a login profile.
fn login_skin(request: &JoinRequest) -> Option<Skin> {
    request
        .properties
        .iter()
        .find(|p| p.name == TEXTURES_PROPERTY)
        .map(|p| Skin::new(p.value.clone(), p.signature.clone().unwrap_or_default()))
}
