mod batcher;
mod client;
mod runner;
mod tokenizer;
mod types;


pub use batcher::{pack, BatchLimits};
pub use client::{EmbedError, EmbeddingClient};
pub use runner::BatchRunner;
pub use tokenizer::TokenCounter;
pub use types::{Batch, EmbeddingRequestItem};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chunker::document_id;
use crate::config::IndexerConfig;

/// Packed little-endian f32 vectors, row-major.
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";
/// Sidecar describing the rows of `embeddings.bin`.
pub const METADATA_FILE: &str = "metadata.json";

/// Alignment sidecar for an embedding matrix. `chunk_ids[i]` labels row `i`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingMetadata {
    pub chunk_ids: Vec<String>,
    /// chunk id -> source file path within the repository.
    pub chunk_to_file: BTreeMap<String, String>,
    pub num_chunks: usize,
    pub embedding_dimension: usize,
    pub model: String,
    pub created_at: String,
}

/// Reads an embedding matrix and its sidecar back from `dir`, validating
/// that the binary payload matches the recorded shape.
pub fn load_embeddings(dir: &Path) -> Result<(Vec<Vec<f32>>, EmbeddingMetadata)> {
    let metadata_path = dir.join(METADATA_FILE);
    let raw = fs::read_to_string(&metadata_path)
        .with_context(|| format!("failed to read {}", metadata_path.display()))?;
    let metadata: EmbeddingMetadata =
        serde_json::from_str(&raw).context("failed to parse embedding metadata")?;

    let bin_path = dir.join(EMBEDDINGS_FILE);
    let bytes = fs::read(&bin_path)
        .with_context(|| format!("failed to read {}", bin_path.display()))?;
    if bytes.len() % 4 != 0 {
        bail!("corrupt embeddings file: {} bytes", bytes.len());
    }

    let floats: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let expected = metadata.num_chunks * metadata.embedding_dimension;
    if floats.len() != expected {
        bail!(
            "embeddings file holds {} floats but metadata expects {} ({} x {})",
            floats.len(),
            expected,
            metadata.num_chunks,
            metadata.embedding_dimension
        );
    }

    let vectors = floats
        .chunks(metadata.embedding_dimension.max(1))
        .map(|row| row.to_vec())
        .collect();
    Ok((vectors, metadata))
}

/// Stage runner: reads `chunks.json` from the preprocessed stage, embeds
/// every chunk, and writes the matrix plus sidecar to the embeddings stage.
pub struct EmbeddingService {
    client: EmbeddingClient,
    counter: TokenCounter,
    limits: BatchLimits,
    pause: Duration,
}

impl EmbeddingService {
    pub fn new(config: &IndexerConfig) -> Self {
        Self {
            client: EmbeddingClient::new(
                &config.embed_base_url,
                &config.embed_api_key,
                &config.embed_model,
            ),
            counter: TokenCounter::new(),
            limits: BatchLimits {
                max_batch_size: config.max_batch_size,
                max_total_tokens: config.max_total_tokens,
                max_sequence_length: config.max_sequence_length,
            },
            pause: config.batch_pause,
        }
    }

    /// Constructor for tests and callers that want full control over the
    /// counter and limits.
    pub fn from_parts(
        client: EmbeddingClient,
        counter: TokenCounter,
        limits: BatchLimits,
        pause: Duration,
    ) -> Self {
        Self {
            client,
            counter,
            limits,
            pause,
        }
    }

    /// Embeds the chunks under `input_dir` into `output_dir`. Skips the
    /// stage entirely when both output files already exist.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        let embeddings_path = output_dir.join(EMBEDDINGS_FILE);
        let metadata_path = output_dir.join(METADATA_FILE);
        if embeddings_path.exists() && metadata_path.exists() {
            info!(dir = %output_dir.display(), "embeddings already present, skipping");
            return Ok(());
        }

        let chunks_path = input_dir.join(crate::preprocess::CHUNKS_FILE);
        let raw = fs::read_to_string(&chunks_path)
            .with_context(|| format!("failed to read {}", chunks_path.display()))?;
        let chunks: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&raw).context("failed to parse chunks file")?;
        if chunks.is_empty() {
            bail!("no chunks to embed in {}", chunks_path.display());
        }

        let mut items = Vec::with_capacity(chunks.len());
        let mut chunk_to_file = BTreeMap::new();
        for (chunk_id, value) in &chunks {
            let text = value
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let title = value
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let formatted = if title.is_empty() {
                text.to_string()
            } else {
                format!("{title}\n{text}")
            };
            let token_count = self.counter.count(&formatted);
            items.push(EmbeddingRequestItem::new(chunk_id.clone(), formatted, token_count));
            chunk_to_file.insert(chunk_id.clone(), document_id(chunk_id).to_string());
        }
        let chunk_ids: Vec<String> = items.iter().map(|item| item.chunk_id.clone()).collect();

        let batches = pack(items, &self.limits, &self.counter);
        info!(
            chunks = chunk_ids.len(),
            batches = batches.len(),
            "embedding preprocessed chunks"
        );

        let vectors = BatchRunner::new(&self.client, self.pause)
            .run(&batches)
            .context("embedding run failed")?;
        if vectors.len() != chunk_ids.len() {
            bail!(
                "embedded {} vectors for {} chunks",
                vectors.len(),
                chunk_ids.len()
            );
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            warn!("provider returned zero-dimensional embeddings");
        }

        fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        let mut bytes = Vec::with_capacity(vectors.len() * dimension * 4);
        for vector in &vectors {
            if vector.len() != dimension {
                bail!(
                    "ragged embedding matrix: expected dimension {}, got {}",
                    dimension,
                    vector.len()
                );
            }
            for value in vector {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        fs::write(&embeddings_path, &bytes)
            .with_context(|| format!("failed to write {}", embeddings_path.display()))?;

        let metadata = EmbeddingMetadata {
            num_chunks: chunk_ids.len(),
            embedding_dimension: dimension,
            chunk_ids,
            chunk_to_file,
            model: self.client.model().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let serialized =
            serde_json::to_string_pretty(&metadata).context("failed to serialize metadata")?;
        fs::write(&metadata_path, serialized)
            .with_context(|| format!("failed to write {}", metadata_path.display()))?;

        info!(
            vectors = metadata.num_chunks,
            dimension,
            dir = %output_dir.display(),
            "wrote embeddings stage"
        );
        Ok(())
    }
}
