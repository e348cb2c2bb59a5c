// SPDX-License-Identifier: AGPL-3.0
// Feature App Core - Persisted documents
//
// A document is a named key-value container of JSON values. Writes are
// staged in memory and only reach durable storage on `save`.

use crate::types::AppError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Open handle on a persisted document
pub trait Document: Send {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Option<Value>;

    /// Stage a write of `value` under `key`
    fn set(&mut self, key: &str, value: Value);

    /// Flush staged writes to durable storage
    fn save(&mut self) -> Result<(), AppError>;

    /// Stage removal of a single key
    fn remove(&mut self, key: &str);

    /// Stage removal of every key
    fn clear(&mut self);

    /// Keys currently present, staged writes included
    fn keys(&self) -> Vec<String>;
}

/// Typed read. `Ok(None)` when the key is absent, an error when the stored
/// value does not deserialize into `T`.
pub fn get_as<T: DeserializeOwned>(doc: &dyn Document, key: &str) -> Result<Option<T>, AppError> {
    match doc.get(key) {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AppError::Serialization(format!("Bad value for {}: {}", key, e))),
        None => Ok(None),
    }
}

/// Opens documents by name, creating them when they do not exist yet
pub trait DocumentStore: Send + Sync {
    fn open(&self, name: &str) -> Result<Box<dyn Document>, AppError>;
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(AppError::InvalidConfig(format!(
            "Invalid document name: {:?}",
            name
        )));
    }
    Ok(())
}

/// Documents stored as JSON object files in a single directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the per-user config directory
    pub fn from_project_dirs() -> Result<Self, AppError> {
        let config_dir = directories::ProjectDirs::from("com", "feature", "app")
            .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        // Ensure the directory exists
        fs::create_dir_all(&config_dir)
            .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;

        Ok(Self::new(config_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentStore for FileStore {
    fn open(&self, name: &str) -> Result<Box<dyn Document>, AppError> {
        validate_name(name)?;
        let path = self.dir.join(name);
        Ok(Box::new(JsonFileDocument::open(path)?))
    }
}

/// A single JSON object file
#[derive(Debug)]
pub struct JsonFileDocument {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileDocument {
    /// Read the file at `path`, or start empty if it does not exist
    pub fn open(path: PathBuf) -> Result<Self, AppError> {
        let entries = if path.exists() {
            tracing::debug!("Reading document {:?}", path);
            let content = fs::read_to_string(&path)
                .map_err(|e| AppError::FileIo(format!("Failed to read {:?}: {}", path, e)))?;

            match serde_json::from_str(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(AppError::Serialization(format!(
                        "Document {:?} is not a JSON object",
                        path
                    )))
                }
                Err(e) => {
                    return Err(AppError::Serialization(format!(
                        "Failed to parse {:?}: {}",
                        path, e
                    )))
                }
            }
        } else {
            tracing::debug!("Document {:?} does not exist yet", path);
            Map::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Document for JsonFileDocument {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::FileIo(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize document: {}", e)))?;

        // Write next to the target, then swap in
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write {:?}: {}", tmp_path, e)))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(AppError::FileIo(format!(
                "Failed to replace {:?}: {}",
                self.path, e
            )));
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

type Committed = Arc<Mutex<HashMap<String, Map<String, Value>>>>;

/// In-memory documents. Clones share the same committed contents, so a
/// document opened after a `save` sees the saved values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Committed,
    fail_opens: Arc<AtomicBool>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the committed contents of a document
    pub fn insert(&self, name: &str, entries: Map<String, Value>) {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entries);
    }

    /// Committed contents of a document, if it was ever saved or inserted
    pub fn snapshot(&self, name: &str) -> Option<Map<String, Value>> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Make every subsequent `open` fail
    pub fn fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `save` fail, including on documents already open
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStore for MemoryStore {
    fn open(&self, name: &str) -> Result<Box<dyn Document>, AppError> {
        validate_name(name)?;
        if self.fail_opens.load(Ordering::SeqCst) {
            return Err(AppError::FileIo(format!("Failed to open {}", name)));
        }

        let staged = self.snapshot(name).unwrap_or_default();
        Ok(Box::new(MemoryDocument {
            name: name.to_string(),
            staged,
            committed: self.committed.clone(),
            fail_saves: self.fail_saves.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct MemoryDocument {
    name: String,
    staged: Map<String, Value>,
    committed: Committed,
    fail_saves: Arc<AtomicBool>,
}

impl Document for MemoryDocument {
    fn get(&self, key: &str) -> Option<Value> {
        self.staged.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.staged.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), AppError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::FileIo(format!("Failed to save {}", self.name)));
        }
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.name.clone(), self.staged.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.staged.remove(key);
    }

    fn clear(&mut self) {
        self.staged.clear();
    }

    fn keys(&self) -> Vec<String> {
        self.staged.keys().cloned().collect()
    }
}
