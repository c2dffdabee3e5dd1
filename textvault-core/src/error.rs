use std::error::Error as StdError;

use thiserror::Error;

/// Failures of the embedding collaborator. The pipeline never retries these;
/// retry policy, if any, belongs to the provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding service returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("embedding service request failed: {0}")]
    Provider(String),
    #[error("embedding error: {0}")]
    Other(#[source] Box<dyn StdError + Send + Sync>),
}

/// Failures of the vector store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid document id: '{0}'")]
    InvalidId(String),
    #[error("document '{0}' is missing an embedding")]
    MissingEmbedding(String),
    #[error("persistence error: {0}")]
    Persistence(#[source] Box<dyn StdError + Send + Sync>),
}
