//! The registry of connected players' skin records.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a plain pair of `HashMap`s. It is not thread-safe by
//! itself; the owner (`SkinsApi`) keeps it behind a short-lived mutex and
//! never holds that mutex across an `.await`. The per-player
//! [`PlayerHandle`] is the lock that guards record mutations.

use std::collections::HashMap;
use std::sync::Arc;

use skinforge_protocol::PlayerUuid;
use tokio::sync::Mutex;

use crate::PlayerRecord;

/// Shared, lockable access to one player's record.
///
/// Lock it for the whole read-modify-persist-apply sequence of a skin
/// change so concurrent changes to the same player serialize.
pub type PlayerHandle = Arc<Mutex<PlayerRecord>>;

struct Entry {
    handle: PlayerHandle,
    /// Name at registration time, used to clean up the name index.
    name_key: String,
}

/// Connected players, keyed by UUID with a case-insensitive name index.
///
/// ## Lifecycle
///
/// ```text
/// join ──→ load/create record ──→ add() ──→ … skin changes … ──→ remove() on quit
/// ```
///
/// Two players can briefly share a name (a rename racing a quit). The name
/// index always points at the most recent registrant, and `remove` only
/// drops a name mapping that still points at the removed UUID.
#[derive(Default)]
pub struct SessionRegistry {
    players: HashMap<PlayerUuid, Entry>,
    names: HashMap<String, PlayerUuid>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record and returns its handle.
    ///
    /// Re-adding a UUID replaces the previous entry; outstanding handles to
    /// the old record keep working but are no longer reachable from here.
    pub fn add(&mut self, record: PlayerRecord) -> PlayerHandle {
        let uuid = record.uuid;
        let name_key = record.name.to_lowercase();

        if let Some(old) = self.players.remove(&uuid) {
            if self.names.get(&old.name_key) == Some(&uuid) {
                self.names.remove(&old.name_key);
            }
        }

        let handle = Arc::new(Mutex::new(record));
        self.names.insert(name_key.clone(), uuid);
        self.players.insert(
            uuid,
            Entry {
                handle: Arc::clone(&handle),
                name_key,
            },
        );

        tracing::debug!(%uuid, "player registered");
        handle
    }

    /// Evicts a player. Returns the handle if they were registered.
    pub fn remove(&mut self, uuid: PlayerUuid) -> Option<PlayerHandle> {
        let entry = self.players.remove(&uuid)?;
        if self.names.get(&entry.name_key) == Some(&uuid) {
            self.names.remove(&entry.name_key);
        }
        tracing::debug!(%uuid, "player evicted");
        Some(entry.handle)
    }

    /// Looks a player up by UUID string or, failing that, by name.
    pub fn get(&self, identifier: &str) -> Option<PlayerHandle> {
        match identifier.parse::<PlayerUuid>() {
            Ok(uuid) => self.get_by_uuid(uuid),
            Err(_) => self.get_by_name(identifier),
        }
    }

    pub fn get_by_uuid(&self, uuid: PlayerUuid) -> Option<PlayerHandle> {
        self.players.get(&uuid).map(|e| Arc::clone(&e.handle))
    }

    /// Case-insensitive name lookup.
    pub fn get_by_name(&self, name: &str) -> Option<PlayerHandle> {
        let uuid = self.names.get(&name.to_lowercase())?;
        self.get_by_uuid(*uuid)
    }

    /// Whether `uuid` is registered.
    pub fn contains(&self, uuid: PlayerUuid) -> bool {
        self.players.contains_key(&uuid)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinforge_protocol::Skin;

    fn record(name: &str) -> PlayerRecord {
        PlayerRecord::new(PlayerUuid::random(), name)
    }

    #[tokio::test]
    async fn test_add_then_get_by_uuid_and_name() {
        let mut registry = SessionRegistry::new();
        let rec = record("Notch");
        let uuid = rec.uuid;
        registry.add(rec);

        assert_eq!(registry.len(), 1);
        let by_uuid = registry.get_by_uuid(uuid).unwrap();
        let by_name = registry.get_by_name("notch").unwrap();
        assert!(Arc::ptr_eq(&by_uuid, &by_name));
        assert_eq!(by_uuid.lock().await.name, "Notch");
    }

    #[test]
    fn test_get_parses_uuid_before_name() {
        let mut registry = SessionRegistry::new();
        let rec = record("Steve");
        let uuid = rec.uuid;
        registry.add(rec);

        assert!(registry.get(&uuid.to_string()).is_some());
        assert!(registry.get("STEVE").is_some());
        assert!(registry.get("nobody").is_none());
        assert!(registry.get(&PlayerUuid::random().to_string()).is_none());
    }

    #[test]
    fn test_remove_evicts_both_indexes() {
        let mut registry = SessionRegistry::new();
        let rec = record("Alex");
        let uuid = rec.uuid;
        registry.add(rec);

        assert!(registry.remove(uuid).is_some());
        assert!(registry.is_empty());
        assert!(registry.get_by_name("Alex").is_none());
        assert!(registry.remove(uuid).is_none());
    }

    #[test]
    fn test_name_collision_most_recent_wins() {
        let mut registry = SessionRegistry::new();
        let first = record("Herobrine");
        let second = record("herobrine");
        let (first_uuid, second_uuid) = (first.uuid, second.uuid);
        registry.add(first);
        registry.add(second);

        let found = registry.get_by_name("Herobrine").unwrap();
        assert!(Arc::ptr_eq(&found, &registry.get_by_uuid(second_uuid).unwrap()));

        // Removing the older player must not drop the newer one's name.
        registry.remove(first_uuid);
        assert!(registry.get_by_name("herobrine").is_some());
    }

    #[tokio::test]
    async fn test_readd_same_uuid_replaces_record() {
        let mut registry = SessionRegistry::new();
        let mut rec = record("Jeb");
        let uuid = rec.uuid;
        registry.add(rec.clone());

        rec.name = "Jeb_".into();
        rec.custom_skin = Some(Skin::new("v", "s"));
        registry.add(rec);

        assert_eq!(registry.len(), 1);
        assert!(registry.get_by_name("Jeb").is_none());
        let handle = registry.get_by_name("jeb_").unwrap();
        assert!(handle.lock().await.has_custom_skin());
        assert!(registry.contains(uuid));
    }
}
