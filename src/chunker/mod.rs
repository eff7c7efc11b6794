mod language;
mod splitter;


pub use language::Language;
pub use splitter::{RecursiveSplitter, DEFAULT_SEPARATORS};

/// Marker separating a document id from the chunk index in a chunk id.
/// Downstream consumers split on this to recover the original file path.
pub const CHUNK_MARKER: &str = "_<chunk>_";

/// One flattened source file, immutable once created and discarded after
/// chunking.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier, typically the path relative to the repository root.
    pub id: String,
    /// Display title; defaults to the identifier.
    pub title: String,
    /// Raw file text.
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            text: text.into(),
        }
    }
}

/// A bounded fragment of a document, ordered by `index` within its parent.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Identifier of the parent document.
    pub doc_id: String,
    /// 0-based position within the parent.
    pub index: usize,
    /// Title inherited from the parent document.
    pub title: String,
    /// Chunk text; at most the configured chunk size except for the
    /// whole-document fallback.
    pub text: String,
    /// Language inferred from the parent's file extension, if any.
    pub language: Option<Language>,
}

impl Chunk {
    /// Deterministic chunk identifier: `<doc_id>_<chunk>_<index>`.
    pub fn id(&self) -> String {
        format!("{}{}{}", self.doc_id, CHUNK_MARKER, self.index)
    }
}

/// Recovers the parent document id from a chunk id by splitting on the
/// chunk marker. Ids without the marker are returned unchanged.
pub fn document_id(chunk_id: &str) -> &str {
    chunk_id
        .split(CHUNK_MARKER)
        .next()
        .unwrap_or(chunk_id)
}

/// Splits documents into ordered, overlapping chunks.
///
/// The splitting strategy is selected from the document's file extension;
/// unrecognized extensions fall back to the generic separator ladder.
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Chunks one document. Whitespace-only documents yield nothing; a
    /// non-empty document whose split comes back empty is emitted whole as
    /// chunk 0 so no content is silently dropped.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let language = Language::from_path(&document.title);
        let splitter = match language {
            Some(language) => {
                RecursiveSplitter::for_language(language, self.chunk_size, self.chunk_overlap)
            }
            None => RecursiveSplitter::new(self.chunk_size, self.chunk_overlap),
        };

        let pieces = splitter.split_text(text);
        if pieces.is_empty() {
            return vec![Chunk {
                doc_id: document.id.clone(),
                index: 0,
                title: document.title.clone(),
                text: text.to_string(),
                language,
            }];
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                doc_id: document.id.clone(),
                index,
                title: document.title.clone(),
                text,
                language,
            })
            .collect()
    }
}
