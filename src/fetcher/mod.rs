//! Downloads a repository archive and extracts it into the raw stage.

mod path;

#[cfg(test)]
mod tests;

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};
use zip::ZipArchive;

use path::sanitize;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Download(String),

    #[error("bad archive: {0}")]
    Archive(String),

    #[error("unsafe path in archive: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Downloads `repo_url` at `tag` (or the default branch when absent) and
/// extracts the tree into `target_dir` with the archive's top-level
/// directory stripped.
///
/// On any failure `target_dir` is removed so a rerun starts from a clean
/// fetch rather than a half-extracted tree.
pub fn download_repo(repo_url: &str, target_dir: &Path, tag: Option<&str>) -> Result<(), FetchError> {
    let url = archive_url(repo_url, tag);
    info!(%url, dir = %target_dir.display(), "fetching repository archive");

    match fetch_and_extract(&url, target_dir) {
        Ok(()) => Ok(()),
        Err(err) => {
            if target_dir.exists() {
                if let Err(cleanup) = fs::remove_dir_all(target_dir) {
                    warn!(error = %cleanup, "failed to clean up after fetch error");
                }
            }
            Err(err)
        }
    }
}

fn archive_url(repo_url: &str, tag: Option<&str>) -> String {
    let base = repo_url.trim_end_matches('/');
    match tag {
        Some(tag) => format!("{base}/archive/refs/tags/{tag}.zip"),
        None => format!("{base}/archive/refs/heads/main.zip"),
    }
}

fn fetch_and_extract(url: &str, target_dir: &Path) -> Result<(), FetchError> {
    let response = reqwest::blocking::get(url)
        .map_err(|err| FetchError::Download(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Download(format!("{url} returned {status}")));
    }
    let bytes = response
        .bytes()
        .map_err(|err| FetchError::Download(err.to_string()))?;

    extract_archive(&bytes, target_dir)
}

/// Extracts a repository ZIP into `target_dir`, stripping the single
/// top-level directory GitHub archives carry. Entries without a slash
/// after stripping (the top-level directory itself) are skipped.
pub(crate) fn extract_archive(bytes: &[u8], target_dir: &Path) -> Result<(), FetchError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| FetchError::Archive(err.to_string()))?;

    fs::create_dir_all(target_dir)?;
    let mut extracted = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| FetchError::Archive(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let Some((_, stripped)) = name.split_once('/') else {
            continue;
        };
        if stripped.is_empty() {
            continue;
        }

        let relative = sanitize(stripped)?;
        let dest = target_dir.join(&relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        fs::write(&dest, contents)?;
        extracted += 1;
    }

    if extracted == 0 {
        return Err(FetchError::Archive("archive contained no files".into()));
    }
    info!(files = extracted, dir = %target_dir.display(), "extracted archive");
    Ok(())
}
