// Wire contract for the embeddings endpoint, plus the batching types that
// feed it.
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
}

#[derive(Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}

/// One chunk formatted and counted, ready for batching. Immutable once
/// derived from its chunk (truncation replaces the whole item).
#[derive(Debug, Clone)]
pub struct EmbeddingRequestItem {
    pub chunk_id: String,
    /// Formatted text: title + newline + chunk text, or the chunk text
    /// alone when the title is empty.
    pub text: String,
    pub token_count: usize,
}

impl EmbeddingRequestItem {
    pub fn new(chunk_id: impl Into<String>, text: impl Into<String>, token_count: usize) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            text: text.into(),
            token_count,
        }
    }
}

/// An ordered group of items submitted to the provider in one request.
///
/// Invariant: `items.len() <= max_batch_size` and `total_tokens <=
/// max_total_tokens`, except for a singleton batch holding one truncated
/// oversized item.
#[derive(Debug, Default)]
pub struct Batch {
    pub items: Vec<EmbeddingRequestItem>,
    pub total_tokens: usize,
}

impl Batch {
    pub fn push(&mut self, item: EmbeddingRequestItem) {
        self.total_tokens += item.token_count;
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item texts in submission order.
    pub fn texts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.text.clone()).collect()
    }
}
