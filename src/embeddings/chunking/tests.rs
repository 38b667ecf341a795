use super::*;
use std::path::PathBuf;

fn document(text: &str) -> Document {
    Document {
        source: PathBuf::from("docs/enrolment.txt"),
        text: text.to_string(),
    }
}

fn small_config() -> ChunkingConfig {
    ChunkingConfig {
        chunk_size: 120,
        chunk_overlap: 30,
    }
}

fn long_text() -> String {
    let mut text = String::new();
    for section in 0..12 {
        text.push_str(&format!(
            "Section {section}. Students must enrol in core courses before the census date. \
             Late enrolment requires approval from the program manager.\n"
        ));
        if section % 3 == 2 {
            text.push('\n');
        }
    }
    text
}

fn prefix_chars(text: &str, count: usize) -> String {
    text.chars().take(count).collect()
}

fn suffix_chars(text: &str, count: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(count)).collect()
}

#[test]
fn short_document_is_single_chunk() {
    let doc = document("Enrol in COSC1111 by March 1.");
    let chunks = chunk_document(&doc, &ChunkingConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Enrol in COSC1111 by March 1.");
    assert_eq!(chunks[0].source, "docs/enrolment.txt");
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].char_count, 29);
}

#[test]
fn empty_and_whitespace_documents_yield_nothing() {
    assert!(chunk_document(&document(""), &ChunkingConfig::default()).is_empty());
    assert!(chunk_document(&document(" \n\n\t "), &ChunkingConfig::default()).is_empty());
}

#[test]
fn chunks_respect_maximum_size() {
    let text = long_text();
    let config = small_config();

    let chunks = split_text(&text, &config);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(
            chunk.chars().count() <= config.chunk_size,
            "chunk of {} chars exceeds {}",
            chunk.chars().count(),
            config.chunk_size
        );
    }
}

#[test]
fn consecutive_chunks_share_overlap() {
    let text = long_text();
    let config = small_config();

    let chunks = split_text(&text, &config);

    for pair in chunks.windows(2) {
        assert_eq!(
            suffix_chars(&pair[0], config.chunk_overlap),
            prefix_chars(&pair[1], config.chunk_overlap)
        );
    }
}

#[test]
fn chunks_cover_the_whole_document() {
    let text = long_text();
    let config = small_config();

    let chunks = split_text(&text, &config);

    let mut rebuilt = chunks[0].clone();
    for chunk in &chunks[1..] {
        rebuilt.extend(chunk.chars().skip(config.chunk_overlap));
    }
    assert_eq!(rebuilt, text);
}

#[test]
fn prefers_paragraph_breaks() {
    let paragraph = "word ".repeat(14);
    let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 10,
    };

    let chunks = split_text(&text, &config);

    assert!(chunks[0].ends_with("\n\n"));
}

#[test]
fn hard_cut_without_separators() {
    let text = "x".repeat(250);
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 20,
    };

    let chunks = split_text(&text, &config);

    assert_eq!(
        chunks.iter().map(String::len).collect::<Vec<_>>(),
        vec![100, 100, 90]
    );
}

#[test]
fn multibyte_text_is_measured_in_chars() {
    let text = "é".repeat(250);
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 20,
    };

    let chunks = split_text(&text, &config);

    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.chars().count() <= 100));
}

#[test]
fn zero_overlap_partitions_text() {
    let text = long_text();
    let config = ChunkingConfig {
        chunk_size: 150,
        chunk_overlap: 0,
    };

    let chunks = split_text(&text, &config);

    assert_eq!(chunks.concat(), text);
}

#[test]
fn chunk_indices_are_sequential() {
    let doc = document(&long_text());
    let chunks = chunk_document(&doc, &small_config());

    for (expected, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, expected);
        assert_eq!(chunk.char_count, chunk.content.chars().count());
    }
}

#[test]
fn whitespace_only_windows_are_dropped() {
    let text = format!("alpha {} omega", "\n".repeat(300));
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 10,
    };

    let chunks = chunk_document(&document(&text), &config);

    assert!(chunks.len() >= 2);
    assert!(chunks.iter().all(|c| !c.content.trim().is_empty()));
    assert!(chunks[0].content.contains("alpha"));
    assert!(chunks[chunks.len() - 1].content.contains("omega"));
    for (expected, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, expected);
    }
}
