use std::collections::HashMap;
use std::fs;
use std::path::Path;

use textvault_core::{Document, Value};

use crate::IngestionError;

/// Reads one source into a normalized document.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Document, IngestionError>;
}

/// Plain-text loader: the document content is the file content, verbatim.
/// No parsing, no encoding detection.
#[derive(Debug, Default)]
pub struct TextLoader {
    extra_metadata: Vec<(String, String)>,
}

impl TextLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge caller-supplied key/value pairs into every loaded document's
    /// metadata. The `source` key is always set from the path and wins on
    /// collision.
    pub fn with_metadata(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_metadata.extend(pairs);
        self
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document, IngestionError> {
        let content = fs::read_to_string(path).map_err(|source| IngestionError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let source = path.to_string_lossy().into_owned();
        let mut metadata = HashMap::new();
        for (key, value) in &self.extra_metadata {
            metadata.insert(key.clone(), Value::String(value.clone()));
        }
        metadata.insert("source".to_string(), Value::String(source.clone()));

        Ok(Document {
            id: source,
            content,
            metadata,
            embedding: None,
        })
    }
}
