mod document;
mod embedding;
mod error;
mod vector_store;

pub use document::Document;
pub use embedding::Embedding;
pub use error::{EmbeddingError, StoreError};
pub use vector_store::{
    PersistentVectorStore, SearchResult, SearchStrategy, StrategyParseError, VectorStore,
};

/// Metadata values are arbitrary JSON so string tags and numeric fields coexist.
pub type Value = serde_json::Value;
