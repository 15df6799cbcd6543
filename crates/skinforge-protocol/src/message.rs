//! Relay messages: skin-change requests sent from the proxy to a backend.
//!
//! A relay message is a flat JSON object:
//!
//! ```json
//! { "action": "set", "player": "Alice", "skin_value": "...", "skin_signature": "..." }
//! ```
//!
//! `action` picks the operation, `player` names the target (display name
//! or UUID, never a reference into the sender's memory), and every other
//! key is an action-specific string field. The receiving backend looks the
//! action up in its dispatch table; this module only knows the shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Skin, SkinModel};

/// The private plugin-message channel that carries relay messages.
pub const SKINS_CHANNEL: &str = "skinforge:skins";

/// Action names understood by the backend.
pub mod action {
    /// Replace the skin: fields `skin_value`, `skin_signature`.
    pub const SET: &str = "set";
    /// Restore the login skin: no fields.
    pub const RESET: &str = "reset";
    /// Copy another player's skin: field `name`.
    pub const SET_BY_NAME: &str = "setByName";
    /// Generate a skin from an image: fields `url`, `model`.
    pub const SET_BY_IMAGE: &str = "setByImage";
}

/// A skin-change request on the relay channel.
///
/// `#[serde(flatten)]` folds the action-specific fields into the same
/// object as `action` and `player`, so the JSON stays flat. All field
/// values are strings; a non-string value fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Dispatch key, see [`action`].
    pub action: String,
    /// Target player: display name or UUID string.
    pub player: String,
    /// Action-specific fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl RelayMessage {
    /// Creates a message with no fields.
    pub fn new(action: impl Into<String>, player: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            player: player.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// `set`: replace the player's skin.
    pub fn set(player: impl Into<String>, skin: &Skin) -> Self {
        Self::new(action::SET, player)
            .with_field("skin_value", skin.value())
            .with_field("skin_signature", skin.signature())
    }

    /// `reset`: restore the player's login skin.
    pub fn reset(player: impl Into<String>) -> Self {
        Self::new(action::RESET, player)
    }

    /// `setByName`: copy the skin of the account called `name`.
    pub fn set_by_name(player: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(action::SET_BY_NAME, player).with_field("name", name)
    }

    /// `setByImage`: generate a skin from an image URL.
    pub fn set_by_image(
        player: impl Into<String>,
        url: impl Into<String>,
        model: SkinModel,
    ) -> Self {
        Self::new(action::SET_BY_IMAGE, player)
            .with_field("url", url)
            .with_field("model", model.to_string())
    }

    /// Returns a required field.
    ///
    /// # Errors
    /// [`ProtocolError::MissingField`] if the field is absent.
    pub fn field(&self, name: &'static str) -> Result<&str, ProtocolError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ProtocolError::MissingField {
                action: self.action.clone(),
                field: name,
            })
    }
}
