//! Record store for finished readings.
//!
//! The orchestrator only ever calls [`ReadingStore::create`]; fetch, list and
//! delete serve the app's history screen.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use uuid::Uuid;

use crate::models::ReadingRecord;

/// Create/fetch/delete store for reading records.
pub trait ReadingStore: Send + Sync {
    fn create(&self, record: ReadingRecord) -> Result<()>;
    fn fetch(&self, id: Uuid) -> Result<Option<ReadingRecord>>;
    /// Returns false when no record had this id.
    fn delete(&self, id: Uuid) -> Result<bool>;
    /// All records, oldest first.
    fn list(&self) -> Result<Vec<ReadingRecord>>;
}

/// Records kept in one pretty-printed JSON array on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<ReadingRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)
            .wrap_err(format!("Failed to read readings from {:?}", self.path))?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records = serde_json::from_str(&json).wrap_err("Failed to deserialize readings")?;
        Ok(records)
    }

    fn save(&self, records: &[ReadingRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .wrap_err(format!("Failed to create directory {:?}", parent))?;
            }
        }
        let json = serde_json::to_string_pretty(records).wrap_err("Failed to serialize readings")?;
        fs::write(&self.path, json)
            .wrap_err(format!("Failed to write readings to {:?}", self.path))?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| eyre!("Reading store lock poisoned"))
    }
}

impl ReadingStore for JsonFileStore {
    fn create(&self, record: ReadingRecord) -> Result<()> {
        let _guard = self.guard()?;
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)
    }

    fn fetch(&self, id: Uuid) -> Result<Option<ReadingRecord>> {
        let _guard = self.guard()?;
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let _guard = self.guard()?;
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }

    fn list(&self) -> Result<Vec<ReadingRecord>> {
        let _guard = self.guard()?;
        self.load()
    }
}

/// Store that forgets everything when dropped.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<ReadingRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, Vec<ReadingRecord>>> {
        self.records
            .lock()
            .map_err(|_| eyre!("Reading store lock poisoned"))
    }
}

impl ReadingStore for InMemoryStore {
    fn create(&self, record: ReadingRecord) -> Result<()> {
        self.records()?.push(record);
        Ok(())
    }

    fn fetch(&self, id: Uuid) -> Result<Option<ReadingRecord>> {
        Ok(self.records()?.iter().find(|r| r.id == id).cloned())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    fn list(&self) -> Result<Vec<ReadingRecord>> {
        Ok(self.records()?.clone())
    }
}
