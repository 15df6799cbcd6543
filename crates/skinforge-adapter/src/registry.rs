//! Choosing the adapter for the running server.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{AdapterError, V1_15R1, V1_16R1, VersionAdapter};

/// A protocol revision tag such as `v1_16_R1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolVersionTag(String);

impl ProtocolVersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Derives the tag from a server implementation package name: the last
    /// dot-separated segment. `org.bukkit.craftbukkit.v1_16_R1` → `v1_16_R1`.
    pub fn from_package_name(package: &str) -> Self {
        let segment = package.rsplit('.').next().unwrap_or(package);
        Self(segment.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolVersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates an adapter instance.
pub type AdapterFactory = fn() -> Arc<dyn VersionAdapter>;

/// Maps revision tags to adapter factories.
///
/// Built once at startup; [`select`](Self::select) is called exactly once
/// per process.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in adapter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(V1_15R1::REVISION, || Arc::new(V1_15R1));
        registry.register("v1_16_R1", || Arc::new(V1_16R1::for_revision("v1_16_R1")));
        registry.register("v1_16_R2", || Arc::new(V1_16R1::for_revision("v1_16_R2")));
        registry.register("v1_16_R3", || Arc::new(V1_16R1::for_revision("v1_16_R3")));
        registry
    }

    /// Registers (or replaces) the factory for a tag.
    pub fn register(&mut self, tag: impl Into<String>, factory: AdapterFactory) {
        self.factories.insert(tag.into(), factory);
    }

    /// Supported tags, sorted.
    pub fn revisions(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiates the adapter for `tag`.
    ///
    /// # Errors
    /// [`AdapterError::UnsupportedProtocolVersion`] if nothing is registered
    /// for the tag.
    pub fn select(&self, tag: &ProtocolVersionTag) -> Result<Arc<dyn VersionAdapter>, AdapterError> {
        let factory = self.factories.get(tag.as_str()).ok_or_else(|| {
            AdapterError::UnsupportedProtocolVersion {
                tag: tag.to_string(),
                supported: self.factories.keys().cloned().collect(),
            }
        })?;
        let adapter = factory();
        tracing::info!(revision = adapter.revision(), "version adapter selected");
        Ok(adapter)
    }
}
