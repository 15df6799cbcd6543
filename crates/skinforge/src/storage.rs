//! Persistent player records.
//!
//! Storage is a black box behind the [`Storage`] trait: load a record,
//! create one, save a changed skin. Two built-ins cover the common cases:
//!
//! - [`MemoryStorage`]: a map that lives as long as the process
//! - [`FileStorage`]: one JSON document per player in a directory
//!
//! [`StorageBackend`] picks one from a [`DatabaseConfig`].
//!
//! Every call is async and runs on the Tokio runtime, never on the game
//! loop.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use skinforge_protocol::PlayerUuid;
use skinforge_session::PlayerRecord;
use tokio::io::AsyncWriteExt;

use crate::DatabaseConfig;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The backend can't be used at all.
    #[error("{0}")]
    Unavailable(String),
}

/// Where [`PlayerRecord`]s are persisted.
pub trait Storage: Send + Sync + 'static {
    /// Loads a player's record, or `None` if they've never joined.
    ///
    /// `name` is the player's current name; a returned record carries it
    /// even if the stored copy has an older one.
    fn load_player(
        &self,
        uuid: PlayerUuid,
        name: &str,
    ) -> impl Future<Output = Result<Option<PlayerRecord>, StorageError>> + Send;

    /// Stores a brand-new record.
    fn create_player(
        &self,
        record: &PlayerRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Saves a record whose skin changed.
    fn update_skin(
        &self,
        record: &PlayerRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Records in a process-local map.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<PlayerUuid, PlayerRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored copy of a record, bypassing any name refresh.
    pub fn get(&self, uuid: PlayerUuid) -> Option<PlayerRecord> {
        self.lock().get(&uuid).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PlayerUuid, PlayerRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    async fn load_player(
        &self,
        uuid: PlayerUuid,
        name: &str,
    ) -> Result<Option<PlayerRecord>, StorageError> {
        Ok(self.lock().get(&uuid).cloned().map(|mut record| {
            record.name = name.to_string();
            record
        }))
    }

    async fn create_player(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        self.lock().insert(record.uuid, record.clone());
        Ok(())
    }

    async fn update_skin(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        self.lock().insert(record.uuid, record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// One `<uuid>.json` file per player.
///
/// Writes go to `<uuid>.json.tmp` first and are renamed over the real file,
/// so a crash mid-write leaves the previous version intact.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a storage directory and checks that it is
    /// writable.
    ///
    /// # Errors
    /// [`StorageError::Unavailable`] if the directory can't be created or
    /// written to.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::Unavailable(format!("cannot create {}: {e}", dir.display()))
        })?;

        let probe = dir.join(".write-probe");
        tokio::fs::write(&probe, b"ok").await.map_err(|e| {
            StorageError::Unavailable(format!("{} is not writable: {e}", dir.display()))
        })?;
        tokio::fs::remove_file(&probe).await?;

        tracing::info!(dir = %dir.display(), "file storage opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, uuid: PlayerUuid) -> PathBuf {
        self.dir.join(format!("{uuid}.json"))
    }

    async fn write(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        let path = self.path_for(record.uuid);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!(player = %record.uuid, "record written");
        Ok(())
    }
}

impl Storage for FileStorage {
    async fn load_player(
        &self,
        uuid: PlayerUuid,
        name: &str,
    ) -> Result<Option<PlayerRecord>, StorageError> {
        let bytes = match tokio::fs::read(self.path_for(uuid)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut record: PlayerRecord = serde_json::from_slice(&bytes)?;
        record.name = name.to_string();
        Ok(Some(record))
    }

    async fn create_player(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        self.write(record).await
    }

    async fn update_skin(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        self.write(record).await
    }
}

// ---------------------------------------------------------------------------
// StorageBackend
// ---------------------------------------------------------------------------

/// The storage chosen by [`DatabaseConfig`].
pub enum StorageBackend {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl StorageBackend {
    /// Opens the configured backend.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StorageError> {
        match config {
            DatabaseConfig::Memory => Ok(Self::Memory(MemoryStorage::new())),
            DatabaseConfig::File { path } => Ok(Self::File(FileStorage::open(path.clone()).await?)),
        }
    }
}

impl Storage for StorageBackend {
    async fn load_player(
        &self,
        uuid: PlayerUuid,
        name: &str,
    ) -> Result<Option<PlayerRecord>, StorageError> {
        match self {
            Self::Memory(s) => s.load_player(uuid, name).await,
            Self::File(s) => s.load_player(uuid, name).await,
        }
    }

    async fn create_player(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        match self {
            Self::Memory(s) => s.create_player(record).await,
            Self::File(s) => s.create_player(record).await,
        }
    }

    async fn update_skin(&self, record: &PlayerRecord) -> Result<(), StorageError> {
        match self {
            Self::Memory(s) => s.update_skin(record).await,
            Self::File(s) => s.update_skin(record).await,
        }
    }
}
