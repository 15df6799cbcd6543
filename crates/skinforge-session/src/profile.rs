//! Where a player's default (login) skin comes from.
//!
//! On an online-mode server the login profile carries a signed `textures`
//! property. Skinforge captures it at join so `reset` can put it back. The
//! [`DefaultSkinProvider`] trait lets a deployment plug in something smarter
//! (e.g. a profile service lookup); [`LoginProfiles`] is the built-in that
//! simply remembers what each player logged in with.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use skinforge_protocol::{PlayerUuid, Skin};

use crate::SessionError;

/// Resolves the skin a player should fall back to when their custom skin
/// is cleared.
///
/// # Example
///
/// ```rust
/// use skinforge_protocol::{PlayerUuid, Skin};
/// use skinforge_session::{DefaultSkinProvider, SessionError};
///
/// /// Everyone resets to the same skin.
/// struct HouseSkin(Skin);
///
/// impl DefaultSkinProvider for HouseSkin {
///     async fn default_skin(&self, _uuid: PlayerUuid) -> Result<Option<Skin>, SessionError> {
///         Ok(Some(self.0.clone()))
///     }
/// }
/// ```
pub trait DefaultSkinProvider: Send + Sync + 'static {
    /// Returns the default skin, or `None` if this provider doesn't know
    /// the player.
    fn default_skin(
        &self,
        uuid: PlayerUuid,
    ) -> impl Future<Output = Result<Option<Skin>, SessionError>> + Send;

    /// Called when a player logs in, with the skin from their login
    /// profile. Does nothing unless the provider keeps login skins.
    fn on_login(&self, uuid: PlayerUuid, skin: Option<&Skin>) {
        let _ = (uuid, skin);
    }

    /// Called when a player logs out.
    fn on_logout(&self, uuid: PlayerUuid) {
        let _ = uuid;
    }
}

/// Login-supplied skins, keyed by player.
#[derive(Default)]
pub struct LoginProfiles {
    skins: RwLock<HashMap<PlayerUuid, Skin>>,
}

impl LoginProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the skin a player logged in with. Replaces any earlier one.
    pub fn remember(&self, uuid: PlayerUuid, skin: Skin) {
        self.skins
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(uuid, skin);
    }

    /// Drops a player's login skin.
    pub fn forget(&self, uuid: PlayerUuid) {
        self.skins
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&uuid);
    }
}

impl DefaultSkinProvider for LoginProfiles {
    async fn default_skin(&self, uuid: PlayerUuid) -> Result<Option<Skin>, SessionError> {
        let skins = self
            .skins
            .read()
            .map_err(|_| SessionError::ProfileLookup("login profile table poisoned".into()))?;
        Ok(skins.get(&uuid).cloned())
    }

    fn on_login(&self, uuid: PlayerUuid, skin: Option<&Skin>) {
        match skin {
            Some(skin) => self.remember(uuid, skin.clone()),
            None => self.forget(uuid),
        }
    }

    fn on_logout(&self, uuid: PlayerUuid) {
        self.forget(uuid);
    }
}
