mod error;
mod hash_embedder;
mod indexer;
mod loader;
mod retriever;
mod splitter;

use std::path::Path;

use textvault_core::Document;

pub use error::{IngestionError, RetrievalError};
pub use hash_embedder::HashEmbedder;
pub use indexer::IndexBuilder;
pub use loader::{DocumentLoader, TextLoader};
pub use retriever::{BaseRetriever, Retriever};
pub use splitter::{
    RecursiveCharacterTextSplitter, RecursiveCharacterTextSplitterBuilder, SplitterConfigError,
    TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};

/// Load one source file and split it into chunk documents in a single step.
pub fn load_and_split(
    path: &Path,
    loader: &dyn DocumentLoader,
    splitter: &dyn TextSplitter,
) -> Result<Vec<Document>, IngestionError> {
    let document = loader.load(path)?;
    Ok(splitter.split_documents(&[document]))
}
