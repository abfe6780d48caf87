use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::patients::repo::PatientRepo;
use crate::storage::{DocumentStore, FileStore, MemoryStore};
use std::sync::Arc;
use tokio::sync::Mutex;

/// `DATA_DIR` value selecting the non-persistent store.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: PatientRepo,
    /// One controller; each request holds the lock for a whole event.
    pub dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = if config.data_dir.as_os_str() == std::ffi::OsStr::new(IN_MEMORY) {
            tracing::warn!("DATA_DIR is {IN_MEMORY}; patients are lost on exit");
            Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
        } else {
            let store = FileStore::open(&config.data_dir).await?;
            tracing::info!(data_dir = %config.data_dir.display(), "document store ready");
            Arc::new(store) as Arc<dyn DocumentStore>
        };
        Ok(Self::from_parts(Arc::new(config), store).await)
    }

    pub async fn from_parts(config: Arc<AppConfig>, store: Arc<dyn DocumentStore>) -> Self {
        let repo = PatientRepo::new(store);
        let dashboard = Dashboard::load(repo.clone()).await;
        Self {
            config,
            repo,
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            public_dir: "public".into(),
            data_dir: "data".into(),
        });
        Self::from_parts(config, Arc::new(MemoryStore::new())).await
    }
}
