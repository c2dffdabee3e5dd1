use std::collections::HashMap;

use serde_json::json;
use textvault_core::Document;
use textvault_retrieval::{RecursiveCharacterTextSplitter, SplitterConfigError};

fn splitter(chunk_size: usize, chunk_overlap: usize) -> RecursiveCharacterTextSplitter {
    RecursiveCharacterTextSplitter::builder()
        .chunk_size(chunk_size)
        .chunk_overlap(chunk_overlap)
        .build()
        .unwrap()
}

#[test]
fn respects_separator_priority() {
    let text = "aa aa\n\nbb bb\n\ncc cc";
    let chunks = splitter(8, 0).split_text(text);

    assert_eq!(chunks, vec!["aa aa\n\n", "bb bb\n\n", "cc cc"]);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn reconstructs_input_without_overlap() {
    let text = "First paragraph with a few words.\n\nSecond paragraph, a bit longer than the first one.\n\nThird.\nFourth line here.";
    let chunks = splitter(24, 0).split_text(text);

    assert!(chunks.len() > 2);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn obeys_size_bound_where_splittable() {
    let text = "A. B. C.";
    let chunks = splitter(4, 0).split_text(text);

    assert_eq!(chunks.concat(), text);
    for chunk in &chunks {
        assert!(
            chunk.chars().count() <= 4,
            "chunk '{chunk}' exceeds the size bound"
        );
    }
}

#[test]
fn preserves_utf8_boundaries() {
    let text = "a🙂b🙂c🙂";
    let chunks = splitter(3, 0).split_text(text);

    assert_eq!(chunks.concat(), text);
    assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 3));
}

#[test]
fn applies_overlap_windows_at_character_level() {
    let chunks = splitter(4, 1).split_text("abcdefghij");

    assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
}

#[test]
fn overlaps_adjacent_chunks_by_trailing_pieces() {
    let chunks = splitter(6, 2).split_text("a b c d");

    assert_eq!(chunks, vec!["a b c ", "c d"]);
    // The second chunk re-includes the first chunk's tail, up to the overlap.
    assert!(chunks[1].starts_with("c "));
    assert!(chunks[0].ends_with("c "));
}

#[test]
fn emits_atomic_oversized_piece_as_is() {
    let splitter = RecursiveCharacterTextSplitter::builder()
        .chunk_size(4)
        .chunk_overlap(0)
        .separators([" "])
        .build()
        .unwrap();

    let chunks = splitter.split_text("abcdefghij xy");

    assert_eq!(chunks, vec!["abcdefghij ", "xy"]);
    assert!(chunks[0].chars().count() > 4);
}

#[test]
fn keeps_chunks_in_source_order() {
    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let chunks = splitter(12, 0).split_text(text);

    let mut cursor = 0;
    for chunk in &chunks {
        let position = text[cursor..]
            .find(chunk.as_str())
            .expect("chunk text missing from source");
        cursor += position + chunk.len();
    }
    assert_eq!(cursor, text.len());
}

#[test]
fn empty_text_yields_no_chunks() {
    assert!(splitter(10, 0).split_text("").is_empty());
}

#[test]
fn rejects_zero_chunk_size() {
    let error = RecursiveCharacterTextSplitter::builder()
        .chunk_size(0)
        .build()
        .unwrap_err();

    assert_eq!(error, SplitterConfigError::ChunkSizeMustBePositive);
}

#[test]
fn rejects_overlap_not_smaller_than_chunk_size() {
    let error = RecursiveCharacterTextSplitter::builder()
        .chunk_size(4)
        .chunk_overlap(4)
        .build()
        .unwrap_err();
    assert_eq!(
        error,
        SplitterConfigError::OverlapMustBeSmallerThanChunkSize {
            size: 4,
            overlap: 4
        }
    );

    let error = RecursiveCharacterTextSplitter::builder()
        .chunk_size(3)
        .chunk_overlap(9)
        .build()
        .unwrap_err();
    assert_eq!(
        error,
        SplitterConfigError::OverlapMustBeSmallerThanChunkSize {
            size: 3,
            overlap: 9
        }
    );
}

#[test]
fn rejects_empty_separator_list() {
    let error = RecursiveCharacterTextSplitter::builder()
        .separators(Vec::<String>::new())
        .build()
        .unwrap_err();

    assert_eq!(error, SplitterConfigError::SeparatorsMustNotBeEmpty);
}

#[test]
fn split_documents_copies_parent_metadata_verbatim() {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), json!("unit-test.txt"));
    metadata.insert("category".to_string(), json!("test"));

    let parent = Document {
        id: "doc-1".to_string(),
        content: "one two three".to_string(),
        metadata: metadata.clone(),
        embedding: None,
    };

    let chunks = splitter(5, 0).split_documents(&[parent]);

    assert!(chunks.len() > 1);
    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata, metadata);
        assert_eq!(chunk.id, format!("doc-1:{index}"));
        assert!(chunk.embedding.is_none());
        assert!(chunk.content.chars().count() <= 5);
    }
}

#[test]
fn split_documents_adds_chunk_index_only_when_requested() {
    let splitter = RecursiveCharacterTextSplitter::builder()
        .chunk_size(5)
        .chunk_overlap(0)
        .chunk_index_metadata(true)
        .build()
        .unwrap();

    let parent = Document {
        id: "doc-1".to_string(),
        content: "one two three".to_string(),
        metadata: HashMap::from([("source".to_string(), json!("unit-test.txt"))]),
        embedding: None,
    };

    let chunks = splitter.split_documents(&[parent]);

    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.get("chunk_index"), Some(&json!(index)));
        assert_eq!(chunk.metadata.get("source"), Some(&json!("unit-test.txt")));
    }
}

#[test]
fn overlap_reincludes_the_previous_tail_across_words() {
    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let chunks = splitter(12, 4).split_text(text);

    assert_eq!(
        chunks,
        vec![
            "alpha beta ",
            "gamma delta ",
            "epsilon ",
            "zeta eta ",
            "eta theta ",
            "iota kappa"
        ]
    );
    // "eta " is carried from one chunk into the next, within the overlap.
    assert!(chunks[3].ends_with("eta "));
    assert!(chunks[4].starts_with("eta "));
}

#[test]
fn is_deterministic_for_fixed_input_and_config() {
    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let first = splitter(12, 4).split_text(text);
    let second = splitter(12, 4).split_text(text);

    assert_eq!(first, second);
}
