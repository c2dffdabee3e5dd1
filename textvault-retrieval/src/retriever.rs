use async_trait::async_trait;
use textvault_core::{Embedding, SearchResult, SearchStrategy, VectorStore};

use crate::RetrievalError;

/// Query side of an index: embed the question, return relevant chunks.
/// Abstracts over retrieval strategies so alternates can be substituted.
#[async_trait]
pub trait BaseRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError>;
}

/// Facade over a built-or-loaded store and a search strategy.
///
/// Construction does no work beyond recording the strategy; an unrecognized
/// strategy tag already failed at [`SearchStrategy::from_str`]. Ranking itself
/// is the store's business, the retriever only selects the strategy.
pub struct Retriever<E, S> {
    embedder: E,
    store: S,
    strategy: SearchStrategy,
}

impl<E, S> Retriever<E, S>
where
    E: Embedding,
    S: VectorStore,
{
    pub fn new(embedder: E, store: S, strategy: SearchStrategy) -> Self {
        Self {
            embedder,
            store,
            strategy,
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let embedding = self.embedder.embed(query).await?;
        Ok(self.store.search(&embedding, top_k, self.strategy).await?)
    }
}

#[async_trait]
impl<E, S> BaseRetriever for Retriever<E, S>
where
    E: Embedding + Send + Sync,
    S: VectorStore + Send + Sync,
{
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        Retriever::retrieve(self, query, top_k).await
    }
}
