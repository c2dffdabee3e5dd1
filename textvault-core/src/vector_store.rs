use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Document, StoreError};

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

/// Query-time ranking strategy. The retriever only selects the strategy;
/// executing it is the store's business.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    #[default]
    Similarity,
    MaxMarginalRelevance,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::Similarity => "similarity",
            SearchStrategy::MaxMarginalRelevance => "max-marginal-relevance",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized search strategy '{0}', expected one of: similarity, mmr, max-marginal-relevance")]
pub struct StrategyParseError(pub String);

impl FromStr for SearchStrategy {
    type Err = StrategyParseError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "similarity" => Ok(SearchStrategy::Similarity),
            "mmr" | "max-marginal-relevance" => Ok(SearchStrategy::MaxMarginalRelevance),
            other => Err(StrategyParseError(other.to_string())),
        }
    }
}

/// Read side of the store collaborator: nearest records for a query vector,
/// ranked by the given strategy.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        strategy: SearchStrategy,
    ) -> Result<Vec<SearchResult>, StoreError>;
}

/// Build/load side of the store collaborator. A store is either built fresh
/// from embedded documents and persisted under `dir`, or loaded back from a
/// directory a previous build populated. The store owns the on-disk layout.
#[async_trait]
pub trait PersistentVectorStore: VectorStore + Sized {
    async fn build(dir: &Path, docs: Vec<Document>) -> Result<Self, StoreError>;

    async fn load(dir: &Path) -> Result<Self, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_known_tags() {
        assert_eq!(
            "similarity".parse::<SearchStrategy>().unwrap(),
            SearchStrategy::Similarity
        );
        assert_eq!(
            "mmr".parse::<SearchStrategy>().unwrap(),
            SearchStrategy::MaxMarginalRelevance
        );
        assert_eq!(
            "max-marginal-relevance".parse::<SearchStrategy>().unwrap(),
            SearchStrategy::MaxMarginalRelevance
        );
    }

    #[test]
    fn strategy_rejects_unknown_tag() {
        let error = "cosine".parse::<SearchStrategy>().unwrap_err();
        assert_eq!(error, StrategyParseError("cosine".to_string()));
        assert!(error.to_string().contains("cosine"));
    }

    #[test]
    fn strategy_default_is_similarity() {
        assert_eq!(SearchStrategy::default(), SearchStrategy::Similarity);
        assert_eq!(SearchStrategy::default().as_str(), "similarity");
    }
}
