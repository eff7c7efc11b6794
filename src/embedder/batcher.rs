use tracing::warn;

use super::tokenizer::TokenCounter;
use super::types::{Batch, EmbeddingRequestItem};

/// Limits a packed batch must respect. Callers guarantee
/// `max_sequence_length <= max_total_tokens` (checked at configuration
/// time, not here).
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    /// Maximum items per batch.
    pub max_batch_size: usize,
    /// Maximum cumulative tokens per batch.
    pub max_total_tokens: usize,
    /// Maximum tokens for one item; longer items are truncated.
    pub max_sequence_length: usize,
}

/// Packs items into batches with a single greedy forward pass.
///
/// Items over `max_sequence_length` are truncated first (logged, non-fatal).
/// The current batch is closed whenever adding the next item would exceed
/// either limit; items are never reordered and never split across batches,
/// so the concatenation of all batches equals the input sequence.
pub fn pack(
    items: Vec<EmbeddingRequestItem>,
    limits: &BatchLimits,
    counter: &TokenCounter,
) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current = Batch::default();

    for mut item in items {
        if item.token_count > limits.max_sequence_length {
            let (text, token_count) = counter.truncate(&item.text, limits.max_sequence_length);
            warn!(
                chunk_id = %item.chunk_id,
                from = item.token_count,
                to = token_count,
                "truncated chunk over the sequence length limit"
            );
            item.text = text;
            item.token_count = token_count;
        }

        let over_count = current.len() + 1 > limits.max_batch_size;
        let over_tokens = current.total_tokens + item.token_count > limits.max_total_tokens;
        if (over_count || over_tokens) && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
        }
        current.push(item);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
