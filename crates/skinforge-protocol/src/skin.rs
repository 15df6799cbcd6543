//! Skin identities: the signed texture a client renders for a player.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Name of the game-profile property that advertises a player's skin.
pub const TEXTURES_PROPERTY: &str = "textures";

/// A signed skin texture.
///
/// `value` is the base64 texture blob handed out by Mojang's session server
/// (it encodes the texture URLs). `signature` is Mojang's signature over
/// that blob; vanilla clients refuse to render a `textures` property whose
/// signature doesn't verify, so the two always travel together.
///
/// Fields are private: a `Skin` is immutable once constructed. Two skins are
/// equal iff both strings are byte-for-byte equal. "No custom skin" is
/// expressed as `Option::<Skin>::None`, never as an empty `Skin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Skin {
    value: String,
    signature: String,
}

impl Skin {
    /// Creates a skin from a texture blob and its signature.
    pub fn new(value: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            signature: signature.into(),
        }
    }

    /// The base64 texture blob.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The signature over [`value`](Self::value).
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

// ---------------------------------------------------------------------------
// SkinModel
// ---------------------------------------------------------------------------

/// The arm model a skin image is drawn for.
///
/// Only matters when a skin is generated from an image: the upload service
/// has to be told which model to sign the texture for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SkinModel {
    /// Classic 4-pixel arms.
    Steve,
    /// Slim 3-pixel arms.
    Alex,
}

impl fmt::Display for SkinModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steve => write!(f, "STEVE"),
            Self::Alex => write!(f, "ALEX"),
        }
    }
}

impl FromStr for SkinModel {
    type Err = ProtocolError;

    /// Case-insensitive; accepts `classic`/`slim` as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "steve" | "classic" => Ok(Self::Steve),
            "alex" | "slim" => Ok(Self::Alex),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown skin model '{other}'"
            ))),
        }
    }
}
