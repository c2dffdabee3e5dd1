use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Value;

/// One unit of text moving through the pipeline.
///
/// The loader produces a document per source file; the splitter produces a
/// document per chunk. Documents are never mutated in place; every stage
/// builds new ones. `metadata` always carries a `source` key identifying where
/// the content came from. `embedding` is populated by the index builder just
/// before the document reaches a store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, Value>,
    pub embedding: Option<Vec<f32>>,
}
