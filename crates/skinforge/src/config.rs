//! Plugin configuration.
//!
//! Configuration arrives already resolved (parsed by whoever hosts the
//! plugin). Every field has a default, so `{}` is a valid config.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skinforge_tick::TickConfig;
use skinforge_world::GameLoopConfig;

/// Top-level settings for [`SkinsPlugin`](crate::SkinsPlugin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinsConfig {
    /// Forces a protocol revision tag instead of detecting it from the
    /// server implementation package.
    pub protocol_version: Option<String>,
    pub database: DatabaseConfig,
    pub relay: RelayConfig,
    /// Game-loop tick rate. 0 runs main-thread tasks as they arrive.
    pub tick_rate_hz: u32,
    /// How long a skin generated from an image stays cached.
    pub hash_ttl_secs: u64,
    /// How often expired image-skin cache entries are swept.
    pub hash_sweep_interval_secs: u64,
}

impl Default for SkinsConfig {
    fn default() -> Self {
        Self {
            protocol_version: None,
            database: DatabaseConfig::default(),
            relay: RelayConfig::default(),
            tick_rate_hz: TickConfig::VANILLA_TICK_RATE_HZ,
            hash_ttl_secs: 3600,
            hash_sweep_interval_secs: 30,
        }
    }
}

impl SkinsConfig {
    /// Clamps out-of-range values.
    pub fn validated(mut self) -> Self {
        if self.hash_sweep_interval_secs == 0 {
            tracing::warn!("hash_sweep_interval_secs must be positive, using 1");
            self.hash_sweep_interval_secs = 1;
        }
        if self.hash_ttl_secs == 0 {
            tracing::warn!("hash_ttl_secs must be positive, using 1");
            self.hash_ttl_secs = 1;
        }
        self
    }

    pub fn hash_ttl(&self) -> Duration {
        Duration::from_secs(self.hash_ttl_secs)
    }

    pub fn hash_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.hash_sweep_interval_secs)
    }

    /// Game-loop settings derived from this config.
    pub fn game_loop(&self) -> GameLoopConfig {
        GameLoopConfig {
            tick: TickConfig::with_rate(self.tick_rate_hz),
        }
    }
}

/// Where player records are kept.
///
/// ```json
/// { "type": "file", "path": "plugins/skinforge/players" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// Records live for the process lifetime only.
    #[default]
    Memory,
    /// One JSON document per player under `path`.
    File { path: PathBuf },
}

/// The backend side of the proxy relay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to accept proxy links on. `None` disables the relay.
    pub bind: Option<String>,
}
