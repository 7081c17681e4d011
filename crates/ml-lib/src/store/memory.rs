//! In-memory artifact store

use super::{Artifact, ArtifactStore, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Artifact store kept in process memory.
///
/// Artifacts are held as encoded bytes, so loads go through the same
/// decoding path as the filesystem store.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    saves: AtomicUsize,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place raw bytes under `name`, bypassing encoding
    pub fn insert_raw(&self, name: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        blobs.insert(name.to_string(), bytes);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(name))
            .unwrap_or(false)
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load(&self, name: &str) -> Result<Option<Artifact>, StoreError> {
        let blobs = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        match blobs.get(name) {
            Some(bytes) => Ok(Some(Artifact::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, name: &str, artifact: &Artifact) -> Result<(), StoreError> {
        let bytes = artifact.to_bytes()?;
        self.insert_raw(name, bytes)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
