//! Directory-backed vector store for textvault.
//!
//! The on-disk layout lives entirely under `<dir>/index/`: `manifest.json`
//! (format version, dimension, record count), `ids.json`, `documents.jsonl`
//! (one record per line, positionally matched with the ids) and
//! `embeddings.json`. Builds stage everything under `<dir>/index.tmp/` and
//! rename it into place, so a failed or interrupted build leaves no
//! recognizable index behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use textvault_core::{
    Document, PersistentVectorStore, SearchResult, SearchStrategy, StoreError, Value, VectorStore,
};
use thiserror::Error;
use tracing::{debug, info};

const INDEX_DIR: &str = "index";
const STAGING_DIR: &str = "index.tmp";
const MANIFEST_FILE: &str = "manifest.json";
const IDS_FILE: &str = "ids.json";
const DOCUMENTS_FILE: &str = "documents.jsonl";
const EMBEDDINGS_FILE: &str = "embeddings.json";
const FORMAT_VERSION: u32 = 1;

/// Max-marginal-relevance works over the `max(4·top_k, 20)` best cosine
/// candidates, balancing relevance and diversity with λ = 0.5.
const MMR_POOL_FLOOR: usize = 20;
const MMR_LAMBDA: f32 = 0.5;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed index artifact {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest expects {expected} records, found {got} in {artifact}")]
    CountMismatch {
        artifact: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("record {index} has dimension {got}, manifest says {expected}")]
    RecordDimension {
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("unsupported index format version {0}")]
    UnsupportedVersion(u32),
}

impl From<PersistenceError> for StoreError {
    fn from(error: PersistenceError) -> Self {
        StoreError::Persistence(Box::new(error))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    dimension: usize,
    count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    content: String,
    metadata: HashMap<String, Value>,
}

/// In-memory index with a columnar on-disk form. Immutable once built or
/// loaded; re-indexing means rebuilding the directory.
#[derive(Debug)]
pub struct LocalVectorStore {
    ids: Vec<String>,
    documents: Vec<StoredDocument>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

impl LocalVectorStore {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn from_documents(docs: Vec<Document>) -> Result<Self, StoreError> {
        let mut ids = Vec::with_capacity(docs.len());
        let mut documents = Vec::with_capacity(docs.len());
        let mut embeddings = Vec::with_capacity(docs.len());
        let mut dimension: Option<usize> = None;

        for mut doc in docs {
            if doc.id.trim().is_empty() {
                return Err(StoreError::InvalidId(doc.id));
            }
            let embedding = doc
                .embedding
                .take()
                .ok_or_else(|| StoreError::MissingEmbedding(doc.id.clone()))?;
            match dimension {
                Some(expected) if expected != embedding.len() => {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        got: embedding.len(),
                    });
                }
                None => dimension = Some(embedding.len()),
                _ => {}
            }

            ids.push(doc.id);
            documents.push(StoredDocument {
                content: doc.content,
                metadata: doc.metadata,
            });
            embeddings.push(embedding);
        }

        Ok(Self {
            ids,
            documents,
            embeddings,
            dimension: dimension.unwrap_or(0),
        })
    }

    async fn persist(&self, dir: &Path) -> Result<(), PersistenceError> {
        let staging = dir.join(STAGING_DIR);
        let index_dir = dir.join(INDEX_DIR);

        // A leftover staging directory means an earlier build died mid-write.
        if staging.exists() {
            remove_dir(&staging).await?;
        }
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|source| PersistenceError::Io {
                path: staging.clone(),
                source,
            })?;

        let manifest = Manifest {
            version: FORMAT_VERSION,
            dimension: self.dimension,
            count: self.ids.len(),
        };
        write_json(&staging.join(MANIFEST_FILE), &manifest).await?;
        write_json(&staging.join(IDS_FILE), &self.ids).await?;
        write_json(&staging.join(EMBEDDINGS_FILE), &self.embeddings).await?;

        let documents_path = staging.join(DOCUMENTS_FILE);
        let mut lines = String::new();
        for document in &self.documents {
            let line =
                serde_json::to_string(document).map_err(|source| PersistenceError::Json {
                    path: documents_path.clone(),
                    source,
                })?;
            lines.push_str(&line);
            lines.push('\n');
        }
        tokio::fs::write(&documents_path, lines)
            .await
            .map_err(|source| PersistenceError::Io {
                path: documents_path,
                source,
            })?;

        // Anything already sitting at index/ failed the populated heuristic
        // upstream; replace the placeholder wholesale.
        if index_dir.exists() {
            remove_dir(&index_dir).await?;
        }
        tokio::fs::rename(&staging, &index_dir)
            .await
            .map_err(|source| PersistenceError::Io {
                path: index_dir.clone(),
                source,
            })?;

        info!(dir = %dir.display(), records = self.ids.len(), "persisted index");
        Ok(())
    }

    async fn read_from(dir: &Path) -> Result<Self, PersistenceError> {
        let index_dir = dir.join(INDEX_DIR);

        let manifest: Manifest = read_json(&index_dir.join(MANIFEST_FILE)).await?;
        if manifest.version != FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(manifest.version));
        }

        let ids: Vec<String> = read_json(&index_dir.join(IDS_FILE)).await?;
        let embeddings: Vec<Vec<f32>> = read_json(&index_dir.join(EMBEDDINGS_FILE)).await?;

        let documents_path = index_dir.join(DOCUMENTS_FILE);
        let raw = tokio::fs::read_to_string(&documents_path)
            .await
            .map_err(|source| PersistenceError::Io {
                path: documents_path.clone(),
                source,
            })?;
        let documents = raw
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<Vec<StoredDocument>, _>>()
            .map_err(|source| PersistenceError::Json {
                path: documents_path,
                source,
            })?;

        for (artifact, got) in [
            (IDS_FILE, ids.len()),
            (DOCUMENTS_FILE, documents.len()),
            (EMBEDDINGS_FILE, embeddings.len()),
        ] {
            if got != manifest.count {
                return Err(PersistenceError::CountMismatch {
                    artifact,
                    expected: manifest.count,
                    got,
                });
            }
        }
        for (index, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != manifest.dimension {
                return Err(PersistenceError::RecordDimension {
                    index,
                    expected: manifest.dimension,
                    got: embedding.len(),
                });
            }
        }

        debug!(dir = %dir.display(), records = ids.len(), "loaded index");
        Ok(Self {
            ids,
            documents,
            embeddings,
            dimension: manifest.dimension,
        })
    }

    fn rank_by_similarity(&self, query: &[f32]) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, embedding)| {
                let mut score = cosine_similarity(query, embedding);
                if score.is_nan() {
                    score = f32::NEG_INFINITY;
                }
                (index, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("scores are not NaN"));
        scored
    }

    /// Greedy MMR: repeatedly pick the candidate with the best
    /// `λ·relevance − (1−λ)·max-similarity-to-selected`.
    fn max_marginal_relevance(
        &self,
        ranked: &[(usize, f32)],
        top_k: usize,
    ) -> Vec<(usize, f32)> {
        let pool = ranked.len().min((top_k * 4).max(MMR_POOL_FLOOR));
        let mut remaining: Vec<(usize, f32)> = ranked[..pool].to_vec();
        let mut selected: Vec<(usize, f32)> = Vec::with_capacity(top_k.min(pool));

        while selected.len() < top_k && !remaining.is_empty() {
            let mut best_position = 0;
            let mut best_value = f32::NEG_INFINITY;
            for (position, (index, relevance)) in remaining.iter().enumerate() {
                let value = if selected.is_empty() {
                    *relevance
                } else {
                    let redundancy = selected
                        .iter()
                        .map(|(chosen, _)| {
                            cosine_similarity(&self.embeddings[*index], &self.embeddings[*chosen])
                        })
                        .fold(f32::NEG_INFINITY, f32::max);
                    MMR_LAMBDA * relevance - (1.0 - MMR_LAMBDA) * redundancy
                };
                if value > best_value {
                    best_value = value;
                    best_position = position;
                }
            }
            selected.push(remaining.remove(best_position));
        }

        selected
    }

    fn result_at(&self, index: usize, score: f32) -> SearchResult {
        SearchResult {
            document: Document {
                id: self.ids[index].clone(),
                content: self.documents[index].content.clone(),
                metadata: self.documents[index].metadata.clone(),
                embedding: None,
            },
            score,
        }
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        strategy: SearchStrategy,
    ) -> Result<Vec<SearchResult>, StoreError> {
        if !self.is_empty() && query_embedding.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                got: query_embedding.len(),
            });
        }
        if top_k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = self.rank_by_similarity(query_embedding);
        let selected = match strategy {
            SearchStrategy::Similarity => ranked.into_iter().take(top_k).collect(),
            SearchStrategy::MaxMarginalRelevance => self.max_marginal_relevance(&ranked, top_k),
        };

        Ok(selected
            .into_iter()
            .map(|(index, score)| self.result_at(index, score))
            .collect())
    }
}

#[async_trait]
impl PersistentVectorStore for LocalVectorStore {
    async fn build(dir: &Path, docs: Vec<Document>) -> Result<Self, StoreError> {
        let store = Self::from_documents(docs)?;
        store.persist(dir).await?;
        Ok(store)
    }

    async fn load(dir: &Path) -> Result<Self, StoreError> {
        Ok(Self::read_from(dir).await?)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

async fn remove_dir(path: &Path) -> Result<(), PersistenceError> {
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
