use thiserror::Error;

/// Failures of the patient document store.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("storage i/o failed for key '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored document under '{key}' is corrupt: {source}")]
    CorruptDocument {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize patients: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
