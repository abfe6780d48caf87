use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RegistryError, RegistryResult};

/// Key/value document storage, one whole document per key.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_item(&self, key: &str) -> RegistryResult<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> RegistryResult<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> RegistryResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| RegistryError::Storage {
                key: dir.display().to_string(),
                source,
            })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get_item(&self, key: &str) -> RegistryResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RegistryError::Storage {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> RegistryResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io = |source: std::io::Error| RegistryError::Storage {
            key: key.to_string(),
            source,
        };
        tokio::fs::write(&tmp, value).await.map_err(io)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        tracing::debug!(key, bytes = value.len(), "document written");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_item(&self, key: &str) -> RegistryResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> RegistryResult<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
