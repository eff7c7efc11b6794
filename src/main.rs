use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use repodex::config::IndexerConfig;
use repodex::pipeline::{Pipeline, LATEST_TAG};

/// Indexes a remote repository into the vector search store.
#[derive(Parser)]
#[command(name = "repodex", version, about)]
struct Cli {
    /// Repository URL, e.g. https://github.com/owner/repo
    repo_url: String,

    /// Tags to index; defaults to the latest default-branch snapshot.
    tags: Vec<String>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match IndexerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    let tags = if cli.tags.is_empty() {
        vec![LATEST_TAG.to_string()]
    } else {
        cli.tags
    };

    let failures = Pipeline::new(config).run(&cli.repo_url, &tags);
    if failures > 0 {
        error!(failures, "some tags failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
