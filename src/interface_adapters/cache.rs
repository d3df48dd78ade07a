// Cache store adapters: one JSON file per key on disk, or a process-local map.

use crate::domain::TrackError;
use crate::domain::ports::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// Persists each key as `<dir>/<key>.json`; survives restarts.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackError::Cache(format!("read {}: {e}", path.display()))),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TrackError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TrackError::Cache(format!("create {}: {e}", self.dir.display())))?;

        // Write then rename so readers never observe a half-written entry.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| TrackError::Cache(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| TrackError::Cache(format!("rename {}: {e}", path.display())))?;
        debug!(key, path = %path.display(), "cache entry written");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TrackError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
