use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use textvault_core::{Document, Embedding, PersistentVectorStore};
use tracing::info;

use crate::RetrievalError;

/// Directory the store is expected to materialize under the persist root.
const INDEX_SUBDIR: &str = "index";

/// An `index/` directory with fewer entries than this is treated as a
/// placeholder rather than a usable index.
const MIN_INDEX_FILES: usize = 4;

/// Produces a usable index from either persisted storage or freshly computed
/// embeddings, without recomputing embeddings unnecessarily.
pub struct IndexBuilder<E, S> {
    embedder: E,
    persist_dir: PathBuf,
    _store: PhantomData<S>,
}

impl<E, S> IndexBuilder<E, S>
where
    E: Embedding,
    S: PersistentVectorStore,
{
    pub fn new(embedder: E, persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            persist_dir: persist_dir.into(),
            _store: PhantomData,
        }
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Load the persisted index when one is recognizably present, otherwise
    /// embed every chunk in one batch and build a fresh one.
    ///
    /// The presence check counts entries under `<persist_dir>/index/`. It does
    /// not compare the chunks against what was indexed, so an index built from
    /// an older version of the source is reused as-is; rebuilding requires
    /// clearing the directory.
    pub async fn build_or_load(&self, chunks: Vec<Document>) -> Result<S, RetrievalError> {
        if index_is_populated(&self.persist_dir) {
            info!(dir = %self.persist_dir.display(), "reusing persisted index");
            return Ok(S::load(&self.persist_dir).await?);
        }

        for chunk in &chunks {
            if chunk.id.trim().is_empty() {
                return Err(RetrievalError::InvalidId(chunk.id.clone()));
            }
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let docs: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(mut chunk, embedding)| {
                chunk.embedding = Some(embedding);
                chunk
            })
            .collect();

        info!(
            dir = %self.persist_dir.display(),
            chunks = docs.len(),
            "building new index"
        );
        Ok(S::build(&self.persist_dir, docs).await?)
    }
}

fn index_is_populated(persist_dir: &Path) -> bool {
    match fs::read_dir(persist_dir.join(INDEX_SUBDIR)) {
        Ok(entries) => entries.count() >= MIN_INDEX_FILES,
        Err(_) => false,
    }
}
