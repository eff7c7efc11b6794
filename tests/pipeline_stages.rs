//! Exercises the stage chain end to end against mock HTTP services:
//! a fake repository tree is preprocessed, embedded, and indexed.

use std::fs;
use std::path::Path;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use repodex::embedder::{
    load_embeddings, BatchLimits, EmbeddingClient, EmbeddingService, TokenCounter,
};
use repodex::index::VectorIndex;
use repodex::preprocess::{Preprocessor, CHUNKS_FILE, CORPUS_FILE};

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn embedding_service(base_url: String) -> EmbeddingService {
    EmbeddingService::from_parts(
        EmbeddingClient::new(base_url, "embed-key", "test-model"),
        TokenCounter::heuristic(),
        BatchLimits {
            max_batch_size: 128,
            max_total_tokens: 16384,
            max_sequence_length: 8192,
        },
        Duration::ZERO,
    )
}

#[test]
fn test_stages_chain_from_tree_to_index() {
    let workdir = tempfile::tempdir().unwrap();
    let raw = workdir.path().join("stage=raw");
    let preprocessed = workdir.path().join("stage=preprocessed");
    let embeddings = workdir.path().join("stage=embeddings");

    write_file(&raw, "src/lib.rs", "pub fn answer() -> u32 { 42 }");
    write_file(&raw, "scripts/run.py", "def main():\n    print('hi')");
    write_file(&raw, "README.md", "# ignored, not code");

    Preprocessor::new(3000, 1000).run(&raw, &preprocessed).unwrap();
    assert!(preprocessed.join(CORPUS_FILE).exists());

    let chunks: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(preprocessed.join(CHUNKS_FILE)).unwrap())
            .unwrap();
    assert_eq!(chunks.len(), 2);

    let embed_server = MockServer::start();
    let embed = embed_server.mock(|when, then| {
        when.method(POST)
            .path("/v1/embeddings")
            .body_contains("src/lib.rs")
            .body_contains("scripts/run.py");
        then.status(200).json_body(json!({
            "data": [
                { "embedding": [1.0, 0.0, 0.0] },
                { "embedding": [0.0, 1.0, 0.0] }
            ]
        }));
    });

    embedding_service(embed_server.base_url())
        .run(&preprocessed, &embeddings)
        .unwrap();
    embed.assert();

    let (vectors, metadata) = load_embeddings(&embeddings).unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(metadata.embedding_dimension, 3);
    assert_eq!(metadata.chunk_ids.len(), 2);
    // Rows stay aligned with the chunk file's key order.
    let chunk_keys: Vec<&String> = chunks.keys().collect();
    assert_eq!(metadata.chunk_ids, chunk_keys.iter().map(|k| k.to_string()).collect::<Vec<_>>());
    for chunk_id in &metadata.chunk_ids {
        let file = &metadata.chunk_to_file[chunk_id];
        assert!(chunk_id.starts_with(file.as_str()));
    }

    let index_server = MockServer::start();
    let upsert = index_server.mock(|when, then| {
        when.method(POST)
            .path("/vectors/upsert")
            .header("Api-Key", "index-key")
            .body_contains("myrepo:v1.2:")
            .body_contains("https://example.com/owner/myrepo/blob/v1.2/");
        then.status(200).json_body(json!({ "upsertedCount": 2 }));
    });

    VectorIndex::new(index_server.base_url(), "index-key", "test-model")
        .index_repository(
            &embeddings,
            "myrepo",
            "v1.2",
            "https://example.com/owner/myrepo",
        )
        .unwrap();
    upsert.assert();
}

#[test]
fn test_embedding_stage_is_skipped_when_outputs_exist() {
    let workdir = tempfile::tempdir().unwrap();
    let preprocessed = workdir.path().join("stage=preprocessed");
    let embeddings = workdir.path().join("stage=embeddings");

    fs::create_dir_all(&embeddings).unwrap();
    fs::write(embeddings.join("embeddings.bin"), b"").unwrap();
    fs::write(embeddings.join("metadata.json"), "{}").unwrap();

    // No chunks file exists and no server is running; a skipped stage must
    // touch neither.
    embedding_service("http://127.0.0.1:1".to_string())
        .run(&preprocessed, &embeddings)
        .unwrap();
}
