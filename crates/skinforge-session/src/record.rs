//! The persisted per-player record.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use skinforge_protocol::{PlayerUuid, Skin};

/// What Skinforge knows about one player.
///
/// Created on first join if storage has nothing for the UUID, then cached
/// in the [`SessionRegistry`](crate::SessionRegistry) until the player quits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub uuid: PlayerUuid,
    /// Last known name. Names can change between logins; the UUID can't.
    pub name: String,
    /// The skin the player chose. `None` means "use the default".
    #[serde(default)]
    pub custom_skin: Option<Skin>,
    /// The skin from the login profile, captured at join. Used by `reset`
    /// when no profile provider can answer.
    #[serde(default)]
    pub default_skin: Option<Skin>,
    pub created_at: SystemTime,
}

impl PlayerRecord {
    /// A fresh record with no skins set.
    pub fn new(uuid: PlayerUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            custom_skin: None,
            default_skin: None,
            created_at: SystemTime::now(),
        }
    }

    /// The skin that should currently be shown: custom first, then default.
    pub fn effective_skin(&self) -> Option<&Skin> {
        self.custom_skin.as_ref().or(self.default_skin.as_ref())
    }

    /// Whether the player picked a skin of their own.
    pub fn has_custom_skin(&self) -> bool {
        self.custom_skin.is_some()
    }
}
