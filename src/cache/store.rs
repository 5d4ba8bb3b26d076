//! Property store implementations backing the decision cache.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

/// Keyed artifact-metadata access, as exposed by the repository manager.
///
/// Implementations must tolerate concurrent readers and writers; the
/// decision cache holds no lock across scan calls, so racing writes for one
/// artifact are possible and last-write-wins is acceptable.
pub trait PropertyStore: Send + Sync {
    fn get_property(&self, artifact: &str, name: &str) -> Option<String>;
    fn set_property(&self, artifact: &str, name: &str, value: &str) -> Result<()>;
}

/// In-memory store for tests and embedders without a metadata backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyStore for MemoryStore {
    fn get_property(&self, artifact: &str, name: &str) -> Option<String> {
        self.entries
            .read()
            .ok()?
            .get(artifact)
            .and_then(|props| props.get(name))
            .cloned()
    }

    fn set_property(&self, artifact: &str, name: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("property store lock poisoned"))?;
        entries
            .entry(artifact.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON document per artifact under a root directory.
///
/// Artifact keys are repository paths with separators in them, so documents
/// are named by the SHA-256 of the key rather than by the key itself.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).context("failed to create property store directory")?;
        Ok(Self { root })
    }

    fn document_path(&self, artifact: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(artifact.as_bytes());
        self.root.join(format!("{:x}.json", hasher.finalize()))
    }

    fn load(&self, artifact: &str) -> HashMap<String, String> {
        match fs::read(self.document_path(artifact)) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }
}

impl PropertyStore for FileStore {
    fn get_property(&self, artifact: &str, name: &str) -> Option<String> {
        self.load(artifact).remove(name)
    }

    fn set_property(&self, artifact: &str, name: &str, value: &str) -> Result<()> {
        let mut document = self.load(artifact);
        document.insert(name.to_string(), value.to_string());
        let bytes = serde_json::to_vec_pretty(&document)
            .context("failed to serialize artifact properties")?;
        fs::write(self.document_path(artifact), bytes)
            .with_context(|| format!("failed to write properties for '{artifact}'"))?;
        debug!(artifact = artifact, property = name, "artifact property written");
        Ok(())
    }
}
