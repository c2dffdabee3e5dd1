use std::path::PathBuf;

use textvault_core::{EmbeddingError, StoreError};
use thiserror::Error;

/// Failures while turning a source file into documents.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("source file not found or unreadable: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while building, loading or querying an index.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid document id: '{0}'")]
    InvalidId(String),
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
