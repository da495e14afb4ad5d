//! Concurrent per-paper extraction.
//!
//! Each citing paper is loaded and extracted on the blocking pool, bounded by
//! a semaphore and raced against a per-paper deadline. A failure, panic or
//! timeout is recorded for that paper only.
//!
//! The permit moves into the blocking closure: a timed-out extraction cannot
//! be cancelled, so it keeps its slot until it actually finishes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

use constellation_common::TargetMetadata;
use constellation_extract::{extract_contexts, ExtractionReport};

use crate::config::Config;
use crate::source_dir::load_source_tree;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaperStatus {
    Done { report: ExtractionReport },
    Failed { error: String },
    TimedOut { after_secs: u64 },
}

#[derive(Debug, Serialize)]
pub struct PaperRun {
    pub paper: PathBuf,
    #[serde(flatten)]
    pub status: PaperStatus,
}

/// Run every paper and return results in input order.
pub async fn run_papers(
    papers: Vec<PathBuf>,
    entry: Option<String>,
    target: Arc<TargetMetadata>,
    config: Arc<Config>,
) -> Vec<PaperRun> {
    let semaphore = Arc::new(Semaphore::new(config.runtime.max_concurrent_papers.max(1)));
    let deadline = Duration::from_secs(config.runtime.per_paper_timeout_secs);

    let handles: Vec<_> = papers
        .into_iter()
        .map(|paper| {
            let semaphore = semaphore.clone();
            let target = target.clone();
            let config = config.clone();
            let entry = entry.clone();
            tokio::spawn(async move {
                let status = match semaphore.acquire_owned().await {
                    Ok(permit) => run_one(paper.clone(), entry, target, config, deadline, permit).await,
                    Err(e) => PaperStatus::Failed { error: format!("scheduler closed: {e}") },
                };
                PaperRun { paper, status }
            })
        })
        .collect();

    let mut runs = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(run) => runs.push(run),
            Err(e) => warn!("Paper task failed to join: {e}"),
        }
    }
    runs
}

async fn run_one(
    paper: PathBuf,
    entry: Option<String>,
    target: Arc<TargetMetadata>,
    config: Arc<Config>,
    deadline: Duration,
    permit: OwnedSemaphorePermit,
) -> PaperStatus {
    let dir = paper.clone();
    run_blocking(paper, deadline, permit, move || {
        let tree = load_source_tree(&dir, entry.as_deref(), &config.extraction)?;
        Ok(extract_contexts(&tree, &target, &config.extraction)?)
    })
    .await
}

async fn run_blocking<F>(paper: PathBuf, deadline: Duration, permit: OwnedSemaphorePermit, job: F) -> PaperStatus
where
    F: FnOnce() -> anyhow::Result<ExtractionReport> + Send + 'static,
{
    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        job()
    });

    match tokio::time::timeout(deadline, work).await {
        Ok(Ok(Ok(report))) => {
            info!(
                paper = %paper.display(),
                outcome = report.outcome.as_str(),
                labels = report.labels.len(),
                "Paper done"
            );
            PaperStatus::Done { report }
        }
        Ok(Ok(Err(e))) => {
            warn!(paper = %paper.display(), "Extraction failed: {e:#}");
            PaperStatus::Failed { error: format!("{e:#}") }
        }
        Ok(Err(join)) => {
            warn!(paper = %paper.display(), "Extraction task aborted: {join}");
            PaperStatus::Failed { error: format!("extraction task aborted: {join}") }
        }
        Err(_) => {
            warn!(paper = %paper.display(), secs = deadline.as_secs(), "Extraction timed out");
            PaperStatus::TimedOut { after_secs: deadline.as_secs() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellation_extract::ContextOutcome;

    fn write_paper(dir: &std::path::Path, cite: &str) {
        std::fs::write(dir.join("main.tex"), format!("\\section{{Results}} {cite}")).unwrap();
        std::fs::write(dir.join("refs.bib"), "@misc{k, doi = {10.1/xyz}}").unwrap();
    }

    fn target() -> Arc<TargetMetadata> {
        Arc::new(TargetMetadata { doi: Some("10.1/xyz".to_string()), ..Default::default() })
    }

    #[tokio::test]
    async fn test_results_keep_input_order_and_isolate_failures() {
        let good = tempfile::tempdir().unwrap();
        write_paper(good.path(), "\\cite{k}");
        let silent = tempfile::tempdir().unwrap();
        write_paper(silent.path(), "");
        let missing = good.path().join("does-not-exist");

        let papers = vec![good.path().to_path_buf(), missing.clone(), silent.path().to_path_buf()];
        let config = Arc::new(Config::default());
        let runs = run_papers(papers, None, target(), config).await;

        assert_eq!(runs.len(), 3);
        match &runs[0].status {
            PaperStatus::Done { report } => {
                assert_eq!(report.outcome, ContextOutcome::Found);
                assert_eq!(report.label_texts(), vec!["Results"]);
            }
            other => panic!("expected report, got {other:?}"),
        }
        assert_eq!(runs[1].paper, missing);
        assert!(matches!(runs[1].status, PaperStatus::Failed { .. }));
        match &runs[2].status {
            PaperStatus::Done { report } => assert_eq!(report.outcome, ContextOutcome::NoInTextUsage),
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timed_out_work_keeps_its_slot_until_it_ends() {
        let semaphore = Arc::new(Semaphore::new(1));
        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let (release, gate) = std::sync::mpsc::channel::<()>();

        let status = run_blocking(PathBuf::from("slow"), Duration::from_millis(20), permit, move || {
            let _ = gate.recv();
            anyhow::bail!("released")
        })
        .await;
        assert!(matches!(status, PaperStatus::TimedOut { .. }));
        assert_eq!(semaphore.available_permits(), 0);

        release.send(()).unwrap();
        let reacquired = tokio::time::timeout(Duration::from_secs(5), semaphore.acquire()).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_missing_entry_is_reported_per_paper() {
        let dir = tempfile::tempdir().unwrap();
        write_paper(dir.path(), "\\cite{k}");
        let runs = run_papers(
            vec![dir.path().to_path_buf()],
            Some("absent.tex".to_string()),
            target(),
            Arc::new(Config::default()),
        )
        .await;
        match &runs[0].status {
            PaperStatus::Failed { error } => assert!(error.contains("absent.tex")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
