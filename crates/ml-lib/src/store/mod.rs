//! Persisted model artifacts
//!
//! Every model owns one named artifact. An artifact is a versioned envelope
//! around the bincode encoding of a trained estimator, carrying a SHA256
//! checksum of the payload so that truncated or tampered files are rejected
//! before deserialization.

mod fs;
mod memory;

pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Current envelope format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Errors raised by artifact stores and envelope decoding
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("artifact belongs to model '{found}', expected '{expected}'")]
    ModelMismatch { found: String, expected: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("artifact store lock poisoned")]
    Poisoned,
}

/// Serialized estimator plus the metadata needed to validate it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub format_version: u32,
    pub model_name: String,
    pub model_type: String,
    pub created_at: i64,
    pub checksum: String,
    pub payload: Vec<u8>,
}

impl Artifact {
    /// Wrap a trained estimator into a new envelope
    pub fn encode<E: Serialize>(
        model_name: &str,
        model_type: &str,
        estimator: &E,
    ) -> Result<Self, StoreError> {
        let payload = bincode::serialize(estimator)?;
        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_name: model_name.to_string(),
            model_type: model_type.to_string(),
            created_at: chrono::Utc::now().timestamp(),
            checksum: compute_checksum(&payload),
            payload,
        })
    }

    /// Validate the envelope and decode the estimator it carries
    pub fn decode<E: DeserializeOwned>(&self, expected_model: &str) -> Result<E, StoreError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        if self.model_name != expected_model {
            return Err(StoreError::ModelMismatch {
                found: self.model_name.clone(),
                expected: expected_model.to_string(),
            });
        }

        let actual = compute_checksum(&self.payload);
        if actual != self.checksum {
            return Err(StoreError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual,
            });
        }

        Ok(bincode::deserialize(&self.payload)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Key-value blob store for model artifacts, keyed by model name
pub trait ArtifactStore: Send + Sync {
    /// Load the artifact stored under `name`, `Ok(None)` if there is none
    fn load(&self, name: &str) -> Result<Option<Artifact>, StoreError>;

    /// Store `artifact` under `name`, replacing any previous one
    fn save(&self, name: &str, artifact: &Artifact) -> Result<(), StoreError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Compute SHA256 checksum of artifact payload
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
