//! Flattens a fetched repository tree into a text corpus and chunks it.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::chunker::{Chunker, Document};

/// Flattened corpus: repository-relative path -> file text.
pub const CORPUS_FILE: &str = "corpus.json";
/// Chunked corpus: chunk id -> { title, text }.
pub const CHUNKS_FILE: &str = "chunks.json";

/// Extensions considered source code; everything else is ignored.
const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "java", "cpp", "c", "h", "hpp", "cs", "rb", "go", "rs", "php", "swift",
    "kt", "scala", "r", "m", "mm", "sh", "ps1", "sql", "html", "css", "jsx", "tsx", "vue",
    "svelte",
];

/// Directory or file names that mark vendored, generated, or tooling
/// content. Matched case-insensitively as substrings of the entry name.
const SKIP_PATTERNS: &[&str] = &[
    ".git",
    "__pycache__",
    ".pytest_cache",
    "node_modules",
    ".venv",
    ".env",
    ".ds_store",
];

fn should_skip(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy().to_lowercase();
    SKIP_PATTERNS.iter().any(|pattern| name.contains(pattern))
}

fn is_code_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            CODE_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

/// Stage runner: reads the raw tree and writes `corpus.json` plus
/// `chunks.json` into the preprocessed stage.
pub struct Preprocessor {
    chunker: Chunker,
}

impl Preprocessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: Chunker::new(chunk_size, chunk_overlap),
        }
    }

    /// Preprocesses `input_dir` into `output_dir`. Skips the stage when
    /// both output files already exist.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        let corpus_path = output_dir.join(CORPUS_FILE);
        let chunks_path = output_dir.join(CHUNKS_FILE);
        if corpus_path.exists() && chunks_path.exists() {
            info!(dir = %output_dir.display(), "preprocessed output already present, skipping");
            return Ok(());
        }

        let documents = self.flatten(input_dir)?;
        if documents.is_empty() {
            bail!("no source files found under {}", input_dir.display());
        }

        let mut corpus = Map::new();
        let mut chunks = Map::new();
        for document in &documents {
            corpus.insert(document.id.clone(), Value::String(document.text.clone()));
            for chunk in self.chunker.chunk(document) {
                chunks.insert(
                    chunk.id(),
                    json!({ "title": chunk.title, "text": chunk.text }),
                );
            }
        }
        if chunks.is_empty() {
            bail!("chunking produced nothing for {}", input_dir.display());
        }

        fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
        fs::write(&corpus_path, serde_json::to_string_pretty(&corpus)?)
            .with_context(|| format!("failed to write {}", corpus_path.display()))?;
        fs::write(&chunks_path, serde_json::to_string_pretty(&chunks)?)
            .with_context(|| format!("failed to write {}", chunks_path.display()))?;

        info!(
            files = documents.len(),
            chunks = chunks.len(),
            dir = %output_dir.display(),
            "wrote preprocessed stage"
        );
        Ok(())
    }

    /// Walks the tree in sorted order and reads every code file into a
    /// document keyed by its repository-relative path. Unreadable files are
    /// logged and dropped rather than failing the stage.
    fn flatten(&self, input_dir: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        let walker = WalkDir::new(input_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !should_skip(entry));
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", input_dir.display()))?;
            if !entry.file_type().is_file() || !is_code_file(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(input_dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            let bytes = match fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %relative, error = %err, "skipping unreadable file");
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            documents.push(Document::new(relative, text));
        }

        Ok(documents)
    }
}
