//! Cache of skins generated from images.
//!
//! Generating a signed skin from an image is slow and rate limited, and
//! players tend to retry the same URL. Results are cached by model + URL
//! for a fixed TTL and swept periodically by a background task.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use skinforge_protocol::{Skin, SkinModel};
use tokio::time::Instant;

/// TTL cache keyed by `"{model}:{url}"`.
///
/// The lock is a plain `std::sync::Mutex`, held only for map operations
/// and never across an `.await`.
pub struct SkinHashCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Skin, Instant)>>,
}

impl SkinHashCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cache key for an image request.
    pub fn key(url: &str, model: SkinModel) -> String {
        format!("{model}:{url}")
    }

    /// A cached skin, unless it has expired.
    pub fn get(&self, key: &str) -> Option<Skin> {
        let entries = self.lock();
        let (skin, inserted) = entries.get(key)?;
        (inserted.elapsed() < self.ttl).then(|| skin.clone())
    }

    pub fn insert(&self, key: String, skin: Skin) {
        self.lock().insert(key, (skin, Instant::now()));
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (_, inserted)| inserted.elapsed() < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "skin hash cache swept");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Skin, Instant)>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
