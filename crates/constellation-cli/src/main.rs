//! Constellation: where does a paper get cited?
//! Entry point for the `constellation` binary: locates every citation of a
//! target paper inside unpacked LaTeX sources of citing papers.

mod config;
mod render;
mod runner;
mod source_dir;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use constellation_common::TargetMetadata;

#[derive(Parser, Debug)]
#[command(name = "constellation", version, about = "Locate the sections in which citing papers cite a target paper")]
struct Cli {
    /// Directories holding the unpacked sources of citing papers.
    #[arg(required = true)]
    papers: Vec<PathBuf>,

    /// Main LaTeX file, relative to each paper directory. Detected when omitted.
    #[arg(long)]
    entry: Option<String>,

    /// YAML or JSON file with the target metadata. Flags below override it.
    #[arg(long)]
    target_file: Option<PathBuf>,

    #[arg(long)]
    title: Option<String>,

    /// Target author, first author first. Repeatable.
    #[arg(long = "author")]
    authors: Vec<String>,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    doi: Option<String>,

    #[arg(long)]
    arxiv: Option<String>,

    #[arg(long, help = "Output machine-readable JSON")]
    json: bool,
}

impl Cli {
    fn target(&self) -> anyhow::Result<TargetMetadata> {
        let mut target = match &self.target_file {
            Some(path) => TargetMetadata::load(path)
                .with_context(|| format!("loading target metadata from {}", path.display()))?,
            None => TargetMetadata::default(),
        };
        if let Some(title) = &self.title {
            target.title = title.clone();
        }
        if !self.authors.is_empty() {
            target.authors = self.authors.clone();
        }
        if self.year.is_some() {
            target.year = self.year;
        }
        if self.doi.is_some() {
            target.doi = self.doi.clone();
        }
        if self.arxiv.is_some() {
            target.arxiv_id = self.arxiv.clone();
        }

        if target.title.trim().is_empty()
            && target.normalized_doi().is_none()
            && target.bare_arxiv_id().is_none()
            && target.first_author().is_none()
        {
            anyhow::bail!("target needs at least one of --title, --doi, --arxiv, --author or --target-file");
        }
        Ok(target)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("constellation=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    info!(
        max_concurrent = config.runtime.max_concurrent_papers,
        timeout_secs = config.runtime.per_paper_timeout_secs,
        title_threshold = config.extraction.title_overlap_threshold,
        "Configuration loaded"
    );

    let target = cli.target()?;
    info!(title = %target.title, doi = ?target.doi, papers = cli.papers.len(), "Tracing citations");

    let runs = runner::run_papers(
        cli.papers.clone(),
        cli.entry.clone(),
        Arc::new(target.clone()),
        Arc::new(config),
    )
    .await;

    if cli.json {
        println!("{}", render::render_json(&runs)?);
    } else {
        print!("{}", render::render_text(&target, &runs));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.yaml");
        std::fs::write(&path, "title: From File\nauthors: [\"Smith, J.\"]\nyear: 2019\n").unwrap();

        let cli = Cli::parse_from([
            "constellation",
            "paper",
            "--target-file",
            path.to_str().unwrap(),
            "--doi",
            "10.1/xyz",
        ]);
        let target = cli.target().unwrap();
        assert_eq!(target.title, "From File");
        assert_eq!(target.year, Some(2019));
        assert_eq!(target.doi.as_deref(), Some("10.1/xyz"));
    }

    #[test]
    fn test_empty_target_is_rejected() {
        let cli = Cli::parse_from(["constellation", "paper"]);
        assert!(cli.target().is_err());
    }

    #[test]
    fn test_papers_are_required() {
        assert!(Cli::try_parse_from(["constellation", "--doi", "10.1/x"]).is_err());
    }
}
