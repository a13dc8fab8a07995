// src/store.rs
//! Append-only triage audit store.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::report::TriageRecord;

#[async_trait]
pub trait TriageStore: Send + Sync {
    async fn append(&self, record: &TriageRecord) -> Result<(), StoreError>;
    fn name(&self) -> &'static str;
}

/// One JSON object per line. Writes are serialized through an async mutex so
/// concurrent submissions never interleave partial lines.
pub struct JsonlStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read back every record (tests and diagnostics).
    pub async fn read_all(&self) -> Result<Vec<TriageRecord>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl TriageStore for JsonlStore {
    async fn append(&self, record: &TriageRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        f.write_all(line.as_bytes()).await?;
        f.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

/// In-memory store for tests and local runs without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<TriageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<TriageRecord> {
        self.records.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TriageStore for MemoryStore {
    async fn append(&self, record: &TriageRecord) -> Result<(), StoreError> {
        let mut v = self
            .records
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("memory store poisoned")))?;
        v.push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(text: &str, level: &str) -> TriageRecord {
        TriageRecord {
            text: text.into(),
            urgency_level: level.into(),
        }
    }

    #[tokio::test]
    async fn jsonl_appends_in_order_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("nested/records.jsonl"));
        assert!(store.read_all().await.unwrap().is_empty());

        store.append(&rec("first", "HIGH")).await.unwrap();
        store.append(&rec("second \"quoted\"\nline", "LOW")).await.unwrap();

        let all = store.read_all().await.unwrap();
        assert_eq!(all, vec![rec("first", "HIGH"), rec("second \"quoted\"\nline", "LOW")]);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.starts_with(r#"{"text":"first","urgencyLevel":"HIGH"}"#));
    }

    #[tokio::test]
    async fn jsonl_fails_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path());
        assert!(store.append(&rec("x", "LOW")).await.is_err());
    }

    #[tokio::test]
    async fn memory_store_keeps_records() {
        let store = MemoryStore::new();
        store.append(&rec("a", "CRITICAL")).await.unwrap();
        assert_eq!(store.snapshot(), vec![rec("a", "CRITICAL")]);
    }
}
