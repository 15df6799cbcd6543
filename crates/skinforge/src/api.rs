//! `SkinsApi`: the one place skin changes happen.
//!
//! In-process callers and the relay messenger both end up here. A change
//! always follows the same steps:
//!
//! 1. Find the player's [`PlayerHandle`] in the registry (`NotOnline` if
//!    absent).
//! 2. Lock it. Concurrent changes to the same player queue up here.
//! 3. Persist the updated record. A storage failure aborts the change
//!    before anything visible happens.
//! 4. Store the record in the handle.
//! 5. Schedule apply + refresh as one main-thread task, still holding the
//!    lock, so tasks reach the game loop in the same order the records
//!    were written.
//!
//! The result is last-write-wins across storage, the registry and the
//! live profile.

use std::sync::{Arc, Mutex, MutexGuard};

use skinforge_adapter::VersionAdapter;
use skinforge_protocol::{PlayerUuid, Skin, SkinModel};
use skinforge_session::{DefaultSkinProvider, PlayerHandle, PlayerRecord, SessionRegistry};
use skinforge_world::MainThread;

use crate::SkinsError;
use crate::hash::SkinHashCache;
use crate::source::SkinSource;
use crate::storage::Storage;

/// A skin change, independent of where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkinRequest {
    /// Use this exact skin.
    Set(Skin),
    /// Drop the custom skin and go back to the default.
    Reset,
    /// Copy the skin of the account with this name.
    FromName(String),
    /// Generate a skin from an image.
    FromImage { url: String, model: SkinModel },
}

struct Inner<S, P, K> {
    storage: S,
    profiles: P,
    source: K,
    registry: Mutex<SessionRegistry>,
    hashes: Arc<SkinHashCache>,
    adapter: Arc<dyn VersionAdapter>,
    main: MainThread,
}

/// Handle to the skin service. Cheap to clone.
pub struct SkinsApi<S, P, K> {
    inner: Arc<Inner<S, P, K>>,
}

impl<S, P, K> Clone for SkinsApi<S, P, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, P, K> SkinsApi<S, P, K>
where
    S: Storage,
    P: DefaultSkinProvider,
    K: SkinSource,
{
    /// Wires the service together. [`SkinsPlugin`](crate::SkinsPlugin)
    /// normally does this.
    pub fn new(
        storage: S,
        profiles: P,
        source: K,
        adapter: Arc<dyn VersionAdapter>,
        main: MainThread,
        hashes: Arc<SkinHashCache>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                profiles,
                source,
                registry: Mutex::new(SessionRegistry::new()),
                hashes,
                adapter,
                main,
            }),
        }
    }

    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    pub fn profiles(&self) -> &P {
        &self.inner.profiles
    }

    pub fn adapter(&self) -> &Arc<dyn VersionAdapter> {
        &self.inner.adapter
    }

    pub fn main_thread(&self) -> &MainThread {
        &self.inner.main
    }

    pub fn hashes(&self) -> &Arc<SkinHashCache> {
        &self.inner.hashes
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// A tracked player by UUID string or name.
    pub fn get_player(&self, identifier: &str) -> Option<PlayerHandle> {
        self.registry().get(identifier)
    }

    pub fn is_tracked(&self, uuid: PlayerUuid) -> bool {
        self.registry().contains(uuid)
    }

    /// Number of players with a loaded record.
    pub fn tracked_count(&self) -> usize {
        self.registry().len()
    }

    fn handle(&self, uuid: PlayerUuid) -> Result<PlayerHandle, SkinsError> {
        self.registry()
            .get_by_uuid(uuid)
            .ok_or_else(|| SkinsError::NotOnline(uuid.to_string()))
    }

    fn registry(&self) -> MutexGuard<'_, SessionRegistry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -----------------------------------------------------------------------
    // Changes
    // -----------------------------------------------------------------------

    /// Gives a player a custom skin and shows it to everyone.
    ///
    /// # Errors
    /// - [`SkinsError::NotOnline`] if the player has no loaded record
    /// - [`SkinsError::Storage`] if persisting fails (nothing changes)
    pub async fn set_skin(&self, uuid: PlayerUuid, skin: Skin) -> Result<(), SkinsError> {
        let handle = self.handle(uuid)?;
        let mut record = handle.lock().await;

        let mut updated = record.clone();
        updated.custom_skin = Some(skin.clone());
        self.inner.storage.update_skin(&updated).await?;
        *record = updated;

        self.schedule_apply(uuid, Some(skin))?;
        tracing::info!(player = %uuid, "custom skin set");
        Ok(())
    }

    /// Same as [`set_skin`](Self::set_skin); the name API consumers know.
    pub async fn set_custom_skin(&self, uuid: PlayerUuid, skin: Skin) -> Result<(), SkinsError> {
        self.set_skin(uuid, skin).await
    }

    /// Drops the player's custom skin and restores their default.
    ///
    /// A no-op when there is no custom skin: nothing is persisted and
    /// nobody is refreshed. The default comes from the
    /// [`DefaultSkinProvider`], falling back to the skin captured at login.
    pub async fn reset_skin(&self, uuid: PlayerUuid) -> Result<(), SkinsError> {
        let handle = self.handle(uuid)?;
        let mut record = handle.lock().await;
        if !record.has_custom_skin() {
            tracing::debug!(player = %uuid, "reset without custom skin, nothing to do");
            return Ok(());
        }

        let mut updated = record.clone();
        updated.custom_skin = None;
        self.inner.storage.update_skin(&updated).await?;

        let default = match self.inner.profiles.default_skin(uuid).await {
            Ok(Some(skin)) => Some(skin),
            Ok(None) => updated.default_skin.clone(),
            Err(e) => {
                tracing::warn!(player = %uuid, error = %e, "default skin lookup failed, using login skin");
                updated.default_skin.clone()
            }
        };
        *record = updated;

        self.schedule_apply(uuid, default)?;
        tracing::info!(player = %uuid, "skin reset");
        Ok(())
    }

    /// Copies the skin of the account called `name`.
    ///
    /// # Errors
    /// [`SkinsError::SkinNotFound`] if the source has no such account.
    pub async fn set_skin_from_name(&self, uuid: PlayerUuid, name: &str) -> Result<(), SkinsError> {
        self.handle(uuid)?;
        let skin = self
            .inner
            .source
            .skin_by_name(name)
            .await?
            .ok_or_else(|| SkinsError::SkinNotFound(name.to_string()))?;
        self.set_skin(uuid, skin).await
    }

    /// Generates a skin from an image, reusing a cached result for the same
    /// URL and model.
    pub async fn set_skin_from_image(
        &self,
        uuid: PlayerUuid,
        url: &str,
        model: SkinModel,
    ) -> Result<(), SkinsError> {
        self.handle(uuid)?;
        let key = SkinHashCache::key(url, model);
        let skin = match self.inner.hashes.get(&key) {
            Some(skin) => {
                tracing::debug!(player = %uuid, %url, "image skin served from cache");
                skin
            }
            None => {
                let skin = self
                    .inner
                    .source
                    .skin_from_image(url, model)
                    .await?
                    .ok_or_else(|| SkinsError::SkinNotFound(url.to_string()))?;
                self.inner.hashes.insert(key, skin.clone());
                skin
            }
        };
        self.set_skin(uuid, skin).await
    }

    /// Runs any [`SkinRequest`]. The relay messenger calls this.
    pub async fn apply_request(&self, uuid: PlayerUuid, request: SkinRequest) -> Result<(), SkinsError> {
        match request {
            SkinRequest::Set(skin) => self.set_skin(uuid, skin).await,
            SkinRequest::Reset => self.reset_skin(uuid).await,
            SkinRequest::FromName(name) => self.set_skin_from_name(uuid, &name).await,
            SkinRequest::FromImage { url, model } => self.set_skin_from_image(uuid, &url, model).await,
        }
    }

    // -----------------------------------------------------------------------
    // Join / quit
    // -----------------------------------------------------------------------

    /// Loads a joining player's record in the background.
    pub fn load_on_join(&self, uuid: PlayerUuid, name: String) -> tokio::task::JoinHandle<()> {
        let api = self.clone();
        tokio::spawn(async move {
            if let Err(e) = api.load_player(uuid, name).await {
                tracing::warn!(player = %uuid, error = %e, "failed to load player skin");
            }
        })
    }

    /// Loads or creates the record, then registers it on the main thread.
    ///
    /// Registration happens in the same main-thread task that confirms the
    /// player is still online and reads their login skin. A quit that
    /// races the load either runs first (the player is gone, nothing is
    /// registered) or after (and evicts the entry). If the record has a
    /// custom skin it is applied in that task too; the refresh is skipped
    /// while the player is dead.
    pub async fn load_player(&self, uuid: PlayerUuid, name: String) -> Result<(), SkinsError> {
        let record = match self.inner.storage.load_player(uuid, &name).await? {
            Some(record) => record,
            None => {
                let record = PlayerRecord::new(uuid, name);
                self.inner.storage.create_player(&record).await?;
                tracing::debug!(player = %uuid, "player record created");
                record
            }
        };

        let api = self.clone();
        let registered = self
            .inner
            .main
            .call(move |world| {
                let player = world.player(uuid)?;
                let mut record = record;
                if let Some(login_skin) = api.inner.adapter.get_skin(player) {
                    record.default_skin = Some(login_skin);
                }
                let custom = record.custom_skin.clone();
                api.registry().add(record);

                if let Some(skin) = custom {
                    let adapter = &api.inner.adapter;
                    if let Some(player) = world.player_mut(uuid) {
                        adapter.apply_skin(player, Some(&skin));
                        if !player.is_dead() {
                            adapter.refresh_skin(world, uuid);
                        }
                    }
                }
                Some(())
            })
            .await?;

        match registered {
            Some(()) => tracing::debug!(player = %uuid, "player skin loaded"),
            None => tracing::debug!(player = %uuid, "player left before skin load finished"),
        }
        Ok(())
    }

    /// Shows a respawned player's custom skin to everyone.
    ///
    /// A player who was dead when their record loaded got the skin on
    /// their profile but no refresh, so other clients still have the old
    /// one. Returns `false` if the player isn't tracked yet (the load
    /// refreshes them itself) or has no custom skin.
    pub async fn on_respawn(&self, uuid: PlayerUuid) -> Result<bool, SkinsError> {
        let Ok(handle) = self.handle(uuid) else {
            return Ok(false);
        };
        let record = handle.lock().await;
        let Some(skin) = record.custom_skin.clone() else {
            return Ok(false);
        };
        self.schedule_apply(uuid, Some(skin))?;
        Ok(true)
    }

    /// Evicts a quitting player's record from the registry. Storage keeps
    /// it. Returns `false` if the player wasn't tracked.
    pub fn on_quit(&self, uuid: PlayerUuid) -> bool {
        self.registry().remove(uuid).is_some()
    }

    // -----------------------------------------------------------------------
    // Main thread
    // -----------------------------------------------------------------------

    /// Queues apply (+ refresh) for one player as a single main-thread task.
    fn schedule_apply(&self, uuid: PlayerUuid, skin: Option<Skin>) -> Result<(), SkinsError> {
        let adapter = Arc::clone(&self.inner.adapter);
        self.inner.main.run_task(move |world| {
            let Some(player) = world.player_mut(uuid) else {
                tracing::trace!(player = %uuid, "player left before skin apply");
                return;
            };
            adapter.apply_skin(player, skin.as_ref());
            adapter.refresh_skin(world, uuid);
        })?;
        Ok(())
    }
}
