//! HTTP client for the vector index data plane.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::embedder::load_embeddings;

/// Vectors per upsert request; the data plane caps request sizes.
const UPSERT_BATCH_SIZE: usize = 100;
/// Vectors sampled when enumerating indexed repositories.
const SAMPLE_LIMIT: usize = 1000;
/// Fallback when the index does not report its dimension.
const DEFAULT_DIMENSION: usize = 1024;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("index returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Metadata stored alongside every vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub repo_name: String,
    pub version: String,
    pub chunk_id: String,
    /// Browsable source location: `<repo_url>/blob/<version>/<path>`.
    pub original_file: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: VectorMetadata,
}

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<VectorRecord>,
}

#[derive(Deserialize, Default)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    pub metadata: Option<VectorMetadata>,
}

#[derive(Deserialize, Default)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Serialize)]
struct DeleteRequest {
    filter: Value,
}

/// Aggregate counts reported by the index.
#[derive(Debug, Deserialize, Default)]
pub struct IndexStats {
    #[serde(rename = "totalVectorCount", default)]
    pub total_vector_count: usize,
    #[serde(default)]
    pub dimension: usize,
}

/// Builds the metadata equality filter the data plane understands.
fn equality_filter(repo_name: Option<&str>, version: Option<&str>) -> Option<Value> {
    let mut filter = serde_json::Map::new();
    if let Some(repo_name) = repo_name {
        filter.insert("repo_name".into(), json!({ "$eq": repo_name }));
    }
    if let Some(version) = version {
        filter.insert("version".into(), json!({ "$eq": version }));
    }
    if filter.is_empty() {
        None
    } else {
        Some(Value::Object(filter))
    }
}

/// Blocking client for a vector index host. All calls go through the host's
/// data plane with an `Api-Key` header.
pub struct VectorIndex {
    http: Client,
    host: String,
    api_key: String,
    embed_model: String,
}

impl VectorIndex {
    pub fn new(
        host: impl Into<String>,
        api_key: impl Into<String>,
        embed_model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            host: host.into(),
            api_key: api_key.into(),
            embed_model: embed_model.into(),
        }
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, IndexError> {
        let url = format!("{}{}", self.host.trim_end_matches('/'), path);
        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(IndexError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json()?)
    }

    /// Uploads a completed embeddings stage. Vector ids follow
    /// `<repo_name>:<version>:<chunk_id>` so a repeat run overwrites the
    /// same records instead of duplicating them.
    pub fn index_repository(
        &self,
        embeddings_dir: &Path,
        repo_name: &str,
        version: &str,
        repo_url: &str,
    ) -> Result<()> {
        let (vectors, metadata) = load_embeddings(embeddings_dir)
            .with_context(|| format!("failed to load {}", embeddings_dir.display()))?;
        let repo_url = repo_url.trim_end_matches('/');

        let mut pending: Vec<VectorRecord> = Vec::with_capacity(UPSERT_BATCH_SIZE);
        let mut uploaded = 0usize;
        for (chunk_id, values) in metadata.chunk_ids.iter().zip(vectors) {
            let file = metadata
                .chunk_to_file
                .get(chunk_id)
                .cloned()
                .unwrap_or_else(|| crate::chunker::document_id(chunk_id).to_string());

            pending.push(VectorRecord {
                id: format!("{repo_name}:{version}:{chunk_id}"),
                values,
                metadata: VectorMetadata {
                    repo_name: repo_name.to_string(),
                    version: version.to_string(),
                    chunk_id: chunk_id.clone(),
                    original_file: format!("{repo_url}/blob/{version}/{file}"),
                    model: metadata.model.clone(),
                },
            });

            if pending.len() == UPSERT_BATCH_SIZE {
                uploaded += self.upsert(std::mem::take(&mut pending))?;
            }
        }
        if !pending.is_empty() {
            uploaded += self.upsert(pending)?;
        }

        info!(repo = repo_name, version, vectors = uploaded, "indexed repository");
        Ok(())
    }

    fn upsert(&self, vectors: Vec<VectorRecord>) -> Result<usize, IndexError> {
        let count = vectors.len();
        debug!(count, "upserting vectors");
        let response: UpsertResponse = self.post("/vectors/upsert", &UpsertRequest { vectors })?;
        if response.upserted_count != 0 && response.upserted_count != count {
            warn!(
                sent = count,
                acknowledged = response.upserted_count,
                "index acknowledged a different vector count"
            );
        }
        Ok(count)
    }

    /// Nearest-neighbor search, optionally scoped to one repository and/or
    /// version via a metadata filter.
    pub fn search(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        repo_name: Option<&str>,
        version: Option<&str>,
    ) -> Result<Vec<QueryMatch>, IndexError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            filter: equality_filter(repo_name, version),
        };
        let response: QueryResponse = self.post("/query", &request)?;
        Ok(response.matches)
    }

    /// Deletes every vector belonging to `repo_name`, or to one version of
    /// it when `version` is given.
    pub fn delete_repository(
        &self,
        repo_name: &str,
        version: Option<&str>,
    ) -> Result<(), IndexError> {
        let filter = equality_filter(Some(repo_name), version)
            .unwrap_or_else(|| json!({}));
        let _: Value = self.post("/vectors/delete", &DeleteRequest { filter })?;
        info!(repo = repo_name, ?version, "deleted repository vectors");
        Ok(())
    }

    pub fn stats(&self) -> Result<IndexStats, IndexError> {
        self.post("/describe_index_stats", &json!({}))
    }

    /// Best-effort enumeration of indexed (repository, version) pairs.
    ///
    /// The data plane has no listing endpoint, so this samples up to
    /// `SAMPLE_LIMIT` vectors with a zero query vector and deduplicates
    /// their metadata. Repositories beyond the sample are missed.
    pub fn list_repositories(&self) -> Result<Vec<(String, String)>, IndexError> {
        let stats = self.stats()?;
        let dimension = if stats.dimension > 0 {
            stats.dimension
        } else {
            DEFAULT_DIMENSION
        };
        if stats.total_vector_count == 0 {
            return Ok(Vec::new());
        }

        let top_k = SAMPLE_LIMIT.min(stats.total_vector_count);
        let matches = self.search(vec![0.0; dimension], top_k, None, None)?;

        let pairs: BTreeSet<(String, String)> = matches
            .into_iter()
            .filter_map(|m| m.metadata)
            .map(|m| (m.repo_name, m.version))
            .collect();
        Ok(pairs.into_iter().collect())
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use httpmock::prelude::*;

    use super::*;
    use crate::embedder::{EmbeddingMetadata, EMBEDDINGS_FILE, METADATA_FILE};

    fn write_embeddings_stage(dir: &Path, chunk_ids: &[&str], dimension: usize) {
        let mut bytes = Vec::new();
        for (row, _) in chunk_ids.iter().enumerate() {
            for col in 0..dimension {
                bytes.extend_from_slice(&((row * dimension + col) as f32).to_le_bytes());
            }
        }
        std::fs::write(dir.join(EMBEDDINGS_FILE), &bytes).unwrap();

        let chunk_to_file: BTreeMap<String, String> = chunk_ids
            .iter()
            .map(|id| (id.to_string(), crate::chunker::document_id(id).to_string()))
            .collect();
        let metadata = EmbeddingMetadata {
            chunk_ids: chunk_ids.iter().map(|id| id.to_string()).collect(),
            chunk_to_file,
            num_chunks: chunk_ids.len(),
            embedding_dimension: dimension,
            model: "test-model".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
        };
        std::fs::write(
            dir.join(METADATA_FILE),
            serde_json::to_string(&metadata).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_index_repository_builds_ids_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_embeddings_stage(dir.path(), &["src/lib.rs_<chunk>_0"], 2);

        let server = MockServer::start();
        let upsert = server.mock(|when, then| {
            when.method(POST)
                .path("/vectors/upsert")
                .header("Api-Key", "index-key")
                .body_contains("\"id\":\"myrepo:v1.0:src/lib.rs_<chunk>_0\"")
                .body_contains("https://example.com/owner/myrepo/blob/v1.0/src/lib.rs");
            then.status(200).json_body(serde_json::json!({ "upsertedCount": 1 }));
        });

        let index = VectorIndex::new(server.base_url(), "index-key", "test-model");
        index
            .index_repository(
                dir.path(),
                "myrepo",
                "v1.0",
                "https://example.com/owner/myrepo",
            )
            .unwrap();
        upsert.assert();
    }

    #[test]
    fn test_index_repository_batches_upserts() {
        let dir = tempfile::tempdir().unwrap();
        let ids: Vec<String> = (0..250).map(|i| format!("f.rs_<chunk>_{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        write_embeddings_stage(dir.path(), &id_refs, 2);

        let server = MockServer::start();
        let upsert = server.mock(|when, then| {
            when.method(POST).path("/vectors/upsert");
            then.status(200).json_body(serde_json::json!({}));
        });

        let index = VectorIndex::new(server.base_url(), "index-key", "test-model");
        index
            .index_repository(dir.path(), "myrepo", "latest", "https://example.com/r")
            .unwrap();

        // 250 vectors at 100 per request.
        assert_eq!(upsert.hits(), 3);
    }

    #[test]
    fn test_search_sends_the_scoping_filter() {
        let server = MockServer::start();
        let query = server.mock(|when, then| {
            when.method(POST)
                .path("/query")
                .body_contains("\"topK\":5")
                .body_contains("\"repo_name\":{\"$eq\":\"myrepo\"}")
                .body_contains("\"version\":{\"$eq\":\"v2\"}");
            then.status(200).json_body(serde_json::json!({
                "matches": [
                    { "id": "myrepo:v2:a_<chunk>_0", "score": 0.9,
                      "metadata": { "repo_name": "myrepo", "version": "v2",
                                    "chunk_id": "a_<chunk>_0",
                                    "original_file": "u/blob/v2/a",
                                    "model": "test-model" } }
                ]
            }));
        });

        let index = VectorIndex::new(server.base_url(), "index-key", "test-model");
        let matches = index
            .search(vec![0.0, 0.0], 5, Some("myrepo"), Some("v2"))
            .unwrap();

        query.assert();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "myrepo:v2:a_<chunk>_0");
        let metadata = matches[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.repo_name, "myrepo");
    }

    #[test]
    fn test_delete_repository_filters_by_name() {
        let server = MockServer::start();
        let delete = server.mock(|when, then| {
            when.method(POST)
                .path("/vectors/delete")
                .body_contains("\"repo_name\":{\"$eq\":\"gone\"}");
            then.status(200).json_body(serde_json::json!({}));
        });

        let index = VectorIndex::new(server.base_url(), "index-key", "test-model");
        index.delete_repository("gone", None).unwrap();
        delete.assert();
    }

    #[test]
    fn test_list_repositories_samples_and_deduplicates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/describe_index_stats");
            then.status(200)
                .json_body(serde_json::json!({ "totalVectorCount": 3, "dimension": 2 }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/query");
            then.status(200).json_body(serde_json::json!({
                "matches": [
                    { "id": "a:v1:x", "metadata": { "repo_name": "a", "version": "v1",
                        "chunk_id": "x", "original_file": "u", "model": "m" } },
                    { "id": "a:v1:y", "metadata": { "repo_name": "a", "version": "v1",
                        "chunk_id": "y", "original_file": "u", "model": "m" } },
                    { "id": "b:v2:z", "metadata": { "repo_name": "b", "version": "v2",
                        "chunk_id": "z", "original_file": "u", "model": "m" } }
                ]
            }));
        });

        let index = VectorIndex::new(server.base_url(), "index-key", "test-model");
        let repos = index.list_repositories().unwrap();
        assert_eq!(
            repos,
            vec![
                ("a".to_string(), "v1".to_string()),
                ("b".to_string(), "v2".to_string())
            ]
        );
    }

    #[test]
    fn test_list_repositories_short_circuits_on_an_empty_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/describe_index_stats");
            then.status(200)
                .json_body(serde_json::json!({ "totalVectorCount": 0, "dimension": 2 }));
        });

        let index = VectorIndex::new(server.base_url(), "index-key", "test-model");
        assert!(index.list_repositories().unwrap().is_empty());
    }

    #[test]
    fn test_api_errors_carry_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/describe_index_stats");
            then.status(401).body("unauthorized");
        });

        let index = VectorIndex::new(server.base_url(), "bad-key", "test-model");
        let err = index.stats().unwrap_err();
        match err {
            IndexError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
