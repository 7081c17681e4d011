//! Filesystem artifact store
//!
//! Artifacts live at `<dir>/<name>.bin`. Writes go to a temp file that is
//! synced and renamed over the final path, so readers never observe a
//! partially written artifact.

use super::{Artifact, ArtifactStore, StoreError};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Artifact store backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the artifact for `name`
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", name))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self, name: &str) -> Result<Option<Artifact>, StoreError> {
        let path = self.artifact_path(name);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No artifact found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let artifact = Artifact::from_bytes(&bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "Read artifact");
        Ok(Some(artifact))
    }

    fn save(&self, name: &str, artifact: &Artifact) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.artifact_path(name);
        let temp_path = path.with_extension("bin.tmp");
        let bytes = artifact.to_bytes()?;

        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        info!(
            model = %name,
            path = %path.display(),
            size = bytes.len(),
            checksum = %artifact.checksum,
            "Saved model artifact"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_artifact() -> Artifact {
        Artifact::encode("churn_model", "RandomForestRegressor", &vec![1.0_f64, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn test_missing_artifact_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path());
        assert!(store.load("churn_model").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path().join("models"));

        let artifact = sample_artifact();
        store.save("churn_model", &artifact).unwrap();

        assert!(store.artifact_path("churn_model").exists());
        assert!(!store.artifact_path("churn_model").with_extension("bin.tmp").exists());

        let loaded = store.load("churn_model").unwrap().unwrap();
        assert_eq!(loaded, artifact);
        let payload: Vec<f64> = loaded.decode("churn_model").unwrap();
        assert_eq!(payload, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path());
        fs::write(store.artifact_path("risk_model"), b"\x01\x02garbage").unwrap();

        assert!(store.load("risk_model").is_err());
    }

    #[test]
    fn test_save_replaces_previous() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path());

        store.save("churn_model", &sample_artifact()).unwrap();
        let replacement =
            Artifact::encode("churn_model", "RandomForestRegressor", &vec![9.0_f64]).unwrap();
        store.save("churn_model", &replacement).unwrap();

        let loaded = store.load("churn_model").unwrap().unwrap();
        let payload: Vec<f64> = loaded.decode("churn_model").unwrap();
        assert_eq!(payload, vec![9.0]);
    }
}
