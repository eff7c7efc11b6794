//! Drives the staged pipeline: fetch, preprocess, embed, index.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::IndexerConfig;
use crate::embedder::EmbeddingService;
use crate::fetcher;
use crate::index::VectorIndex;
use crate::preprocess::Preprocessor;

pub const RAW_STAGE: &str = "stage=raw";
pub const PREPROCESSED_STAGE: &str = "stage=preprocessed";
pub const EMBEDDINGS_STAGE: &str = "stage=embeddings";
/// Tag name standing in for the repository's default branch.
pub const LATEST_TAG: &str = "latest";

/// Last path segment of a repository URL, used as the local directory name
/// and the `repo_name` metadata field.
pub fn repo_name_from_url(repo_url: &str) -> &str {
    repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo_url)
}

/// Runs every stage for one repository across a set of tags. Stage outputs
/// are laid out under `data/<repo>/<tag>/stage=*` and completed stages are
/// skipped on rerun.
pub struct Pipeline {
    config: IndexerConfig,
    preprocessor: Preprocessor,
    embedder: EmbeddingService,
    index: VectorIndex,
}

impl Pipeline {
    pub fn new(config: IndexerConfig) -> Self {
        let preprocessor = Preprocessor::new(config.chunk_size, config.chunk_overlap);
        let embedder = EmbeddingService::new(&config);
        let index = VectorIndex::new(
            &config.index_host,
            &config.index_api_key,
            &config.embed_model,
        );
        Self {
            config,
            preprocessor,
            embedder,
            index,
        }
    }

    /// Processes each tag independently. A failing tag is logged and the
    /// remaining tags still run; the error count is returned so callers can
    /// surface partial failure.
    pub fn run(&self, repo_url: &str, tags: &[String]) -> usize {
        let mut failures = 0;
        for tag in tags {
            info!(repo = repo_url, tag, "starting pipeline");
            if let Err(err) = self.run_tag(repo_url, tag) {
                error!(repo = repo_url, tag, error = ?err, "pipeline failed for tag");
                failures += 1;
            }
        }
        failures
    }

    fn run_tag(&self, repo_url: &str, tag: &str) -> Result<()> {
        let repo_name = repo_name_from_url(repo_url);
        let tag_dir = self.tag_dir(repo_name, tag);
        let raw_dir = tag_dir.join(RAW_STAGE);
        let preprocessed_dir = tag_dir.join(PREPROCESSED_STAGE);
        let embeddings_dir = tag_dir.join(EMBEDDINGS_STAGE);

        if raw_dir.exists() {
            info!(dir = %raw_dir.display(), "raw stage already present, skipping fetch");
        } else {
            let git_tag = if tag == LATEST_TAG { None } else { Some(tag) };
            if let Err(err) = fetcher::download_repo(repo_url, &raw_dir, git_tag) {
                // Remove the whole tag directory so a rerun re-fetches
                // instead of trusting partial state.
                if tag_dir.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&tag_dir) {
                        warn!(error = %cleanup, "failed to clean up failed tag");
                    }
                }
                return Err(err).context("fetch stage failed");
            }
        }

        self.preprocessor
            .run(&raw_dir, &preprocessed_dir)
            .context("preprocess stage failed")?;
        self.embedder
            .run(&preprocessed_dir, &embeddings_dir)
            .context("embedding stage failed")?;
        self.index
            .index_repository(&embeddings_dir, repo_name, tag, repo_url)
            .context("index stage failed")?;

        info!(repo = repo_name, tag, "pipeline complete");
        Ok(())
    }

    fn tag_dir(&self, repo_name: &str, tag: &str) -> PathBuf {
        self.config.data_dir.join(repo_name).join(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_from_url() {
        assert_eq!(
            repo_name_from_url("https://github.com/owner/myrepo"),
            "myrepo"
        );
        assert_eq!(
            repo_name_from_url("https://github.com/owner/myrepo/"),
            "myrepo"
        );
        assert_eq!(repo_name_from_url("myrepo"), "myrepo");
    }
}
