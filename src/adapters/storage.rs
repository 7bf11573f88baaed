use crate::domain::ports::KvStore;
use crate::utils::error::{ContentError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ContentError::DraftStoreError {
            message: format!("invalid store key '{}'", key),
        })
    }
}

/// One pretty-printed JSON file per key inside `base_path`.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    base_path: PathBuf,
}

impl FileKvStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let full_path = self.key_path(key)?;

        let data = match tokio::fs::read(&full_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value: Value =
            serde_json::from_slice(&data).map_err(|e| ContentError::DraftStoreError {
                message: format!("{} is not valid JSON: {}", full_path.display(), e),
            })?;

        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let full_path = self.key_path(key)?;
        tokio::fs::create_dir_all(&self.base_path).await?;

        // 先寫暫存檔再 rename，避免寫到一半留下壞掉的草稿
        let data = serde_json::to_vec_pretty(&value)?;
        let tmp_path = full_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &full_path).await?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}

/// In-process store, shared between clones. Counts writes so callers can
/// observe how often the store was hit.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored value, including a `null` sentinel.
    pub async fn raw(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).filter(|v| !v.is_null()).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        check_key(key)?;
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
