//! Identity newtypes shared by every Skinforge crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PlayerUuid
// ---------------------------------------------------------------------------

/// The stable 128-bit identity of a player.
///
/// A player's display name can change over time; the UUID never does, so it
/// is the primary key everywhere (registry, storage, world). The newtype
/// keeps it from being confused with any other UUID in the process.
///
/// `#[serde(transparent)]` serializes it as the bare hyphenated string,
/// the same shape Mojang's APIs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerUuid(pub Uuid);

impl PlayerUuid {
    /// Generates a random (version 4) player UUID.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PlayerUuid {
    type Err = uuid::Error;

    /// Accepts both the hyphenated and the undashed (Mojang API) forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for PlayerUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// The per-process numeric id of an entity, as it appears in game packets.
///
/// Unlike [`PlayerUuid`], this is reassigned on every join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_uuid_serializes_as_hyphenated_string() {
        let uuid: PlayerUuid = "069a79f4-44e9-4726-a5be-fca90e38aaf5".parse().unwrap();
        let json = serde_json::to_string(&uuid).unwrap();
        assert_eq!(json, "\"069a79f4-44e9-4726-a5be-fca90e38aaf5\"");
    }

    #[test]
    fn test_player_uuid_parses_undashed_form() {
        // Mojang's session server hands out UUIDs without dashes.
        let dashed: PlayerUuid = "069a79f4-44e9-4726-a5be-fca90e38aaf5".parse().unwrap();
        let undashed: PlayerUuid = "069a79f444e94726a5befca90e38aaf5".parse().unwrap();
        assert_eq!(dashed, undashed);
    }

    #[test]
    fn test_player_uuid_rejects_names() {
        assert!("Notch".parse::<PlayerUuid>().is_err());
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(12).to_string(), "E-12");
    }
}
