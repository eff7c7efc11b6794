use std::time::Duration;

use tracing::{debug, info};

use super::client::{EmbedError, EmbeddingClient};
use super::types::Batch;

/// Submits batches strictly in order, one at a time, pausing between
/// consecutive requests to respect provider rate limits.
///
/// A failed batch aborts the whole run; no partial result is returned.
pub struct BatchRunner<'a> {
    client: &'a EmbeddingClient,
    pause: Duration,
}

impl<'a> BatchRunner<'a> {
    pub fn new(client: &'a EmbeddingClient, pause: Duration) -> Self {
        Self { client, pause }
    }

    /// Runs every batch sequentially and returns the concatenated vectors,
    /// aligned with the items across all batches. The pause is applied
    /// before each batch after the first, never after the last.
    pub fn run(&self, batches: &[Batch]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let total_items: usize = batches.iter().map(Batch::len).sum();
        let mut vectors = Vec::with_capacity(total_items);

        for (i, batch) in batches.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                std::thread::sleep(self.pause);
            }
            debug!(
                batch = i + 1,
                of = batches.len(),
                items = batch.len(),
                tokens = batch.total_tokens,
                "embedding batch"
            );

            let embedded = self.client.embed(batch.texts())?;
            if embedded.len() != batch.len() {
                return Err(EmbedError::CountMismatch {
                    expected: batch.len(),
                    got: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        if vectors.len() != total_items {
            return Err(EmbedError::CountMismatch {
                expected: total_items,
                got: vectors.len(),
            });
        }
        info!(batches = batches.len(), vectors = vectors.len(), "embedding run complete");
        Ok(vectors)
    }
}
