use std::collections::VecDeque;

use textvault_core::{Document, Value};
use thiserror::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Coarse to fine: paragraphs, lines, words, then anywhere.
const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitterConfigError {
    #[error("chunk_size must be greater than zero")]
    ChunkSizeMustBePositive,
    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapMustBeSmallerThanChunkSize { size: usize, overlap: usize },
    #[error("at least one separator is required")]
    SeparatorsMustNotBeEmpty,
}

/// Splits text into retrieval-sized chunks. Implementations must be
/// deterministic and preserve source order.
pub trait TextSplitter: Send + Sync {
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split each document, carrying its metadata onto every chunk. Chunk ids
    /// are `<parent id>:<ordinal>` with ordinals in source order.
    fn split_documents(&self, docs: &[Document]) -> Vec<Document>;
}

/// Recursive-descent splitter over a separator hierarchy.
///
/// The text is split on the coarsest separator that occurs in it; pieces that
/// still exceed `chunk_size` (counted in chars) recurse into the finer
/// separators, bottoming out at character windows when the empty separator is
/// reached. Pieces keep their trailing separator, so concatenating the chunks
/// of a zero-overlap split reproduces the input exactly. A piece that no
/// remaining separator can shrink is emitted as-is even when it exceeds
/// `chunk_size`; that is the documented escape hatch, not an error.
#[derive(Clone, Debug)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    chunk_index_metadata: bool,
}

impl RecursiveCharacterTextSplitter {
    pub fn builder() -> RecursiveCharacterTextSplitterBuilder {
        RecursiveCharacterTextSplitterBuilder::default()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.split_with(text, &self.separators)
    }

    pub fn split_documents(&self, docs: &[Document]) -> Vec<Document> {
        let mut chunks = Vec::new();
        for doc in docs {
            for (index, content) in self.split_text(&doc.content).into_iter().enumerate() {
                let mut metadata = doc.metadata.clone();
                if self.chunk_index_metadata {
                    metadata.insert("chunk_index".to_string(), Value::from(index));
                }
                chunks.push(Document {
                    id: format!("{}:{index}", doc.id),
                    content,
                    metadata,
                    embedding: None,
                });
            }
        }
        chunks
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (position, separator) = pick_separator(text, separators);
        let remaining = &separators[position + 1..];

        if separator.is_empty() {
            return self.char_windows(text);
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece.to_string());
                continue;
            }

            // An oversized piece closes out the run collected so far, then is
            // either refined with the finer separators or emitted whole.
            if !pending.is_empty() {
                chunks.extend(self.merge(std::mem::take(&mut pending)));
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(pending));
        }

        chunks
    }

    /// Greedy merge of within-bound pieces: grow a window until the next piece
    /// would overflow `chunk_size`, emit it, then keep at most `chunk_overlap`
    /// trailing chars as the start of the next window.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<String> = VecDeque::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if window_len + piece_len > self.chunk_size && !window.is_empty() {
                chunks.push(window.iter().map(String::as_str).collect());
                while window_len > self.chunk_overlap
                    || (window_len + piece_len > self.chunk_size && window_len > 0)
                {
                    let dropped = window.pop_front().expect("window is non-empty");
                    window_len -= char_len(&dropped);
                }
            }
            window_len += piece_len;
            window.push_back(piece);
        }

        if !window.is_empty() {
            chunks.push(window.iter().map(String::as_str).collect());
        }

        chunks
    }

    /// Last-resort split: windows of `chunk_size` chars advancing by
    /// `chunk_size - chunk_overlap`, always on char boundaries.
    fn char_windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = usize::min(start + self.chunk_size, chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl TextSplitter for RecursiveCharacterTextSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        RecursiveCharacterTextSplitter::split_text(self, text)
    }

    fn split_documents(&self, docs: &[Document]) -> Vec<Document> {
        RecursiveCharacterTextSplitter::split_documents(self, docs)
    }
}

/// First separator that occurs in the text; the empty separator matches
/// anything. Falls back to the last separator so an unmatchable text still
/// yields a single piece.
fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (usize, &'a str) {
    for (position, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator.as_str()) {
            return (position, separator);
        }
    }
    (separators.len() - 1, separators[separators.len() - 1].as_str())
}

/// Split on `separator`, leaving each occurrence attached to the piece it
/// terminates, so the pieces concatenate back to `text`.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(position) = rest.find(separator) {
        let end = position + separator.len();
        pieces.push(&rest[..end]);
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[derive(Clone, Debug)]
pub struct RecursiveCharacterTextSplitterBuilder {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    chunk_index_metadata: bool,
}

impl Default for RecursiveCharacterTextSplitterBuilder {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            chunk_index_metadata: false,
        }
    }
}

impl RecursiveCharacterTextSplitterBuilder {
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Replace the separator hierarchy, coarsest first. Include the empty
    /// string as the last entry to allow character-level fallback.
    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Record each chunk's ordinal under a `chunk_index` metadata key.
    /// Off by default: chunks carry their parent's metadata verbatim.
    pub fn chunk_index_metadata(mut self, enabled: bool) -> Self {
        self.chunk_index_metadata = enabled;
        self
    }

    pub fn build(self) -> Result<RecursiveCharacterTextSplitter, SplitterConfigError> {
        if self.chunk_size == 0 {
            return Err(SplitterConfigError::ChunkSizeMustBePositive);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(SplitterConfigError::OverlapMustBeSmallerThanChunkSize {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        if self.separators.is_empty() {
            return Err(SplitterConfigError::SeparatorsMustNotBeEmpty);
        }
        Ok(RecursiveCharacterTextSplitter {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            separators: self.separators,
            chunk_index_metadata: self.chunk_index_metadata,
        })
    }
}
