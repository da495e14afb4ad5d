//! Terminal and JSON rendering of per-paper results.

use std::fmt::Write as _;

use constellation_common::TargetMetadata;
use constellation_extract::{ContextOutcome, ExtractionReport};

use crate::runner::{PaperRun, PaperStatus};

pub fn render_json(runs: &[PaperRun]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(runs)?)
}

/// Paper → labels tree, one block per paper.
pub fn render_text(target: &TargetMetadata, runs: &[PaperRun]) -> String {
    let mut out = String::new();
    let heading = if target.title.is_empty() {
        target.doi.as_deref().or(target.arxiv_id.as_deref()).unwrap_or("target")
    } else {
        target.title.as_str()
    };
    let _ = writeln!(out, "Citation contexts for: {heading}");

    for run in runs {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", run.paper.display());
        match &run.status {
            PaperStatus::Done { report } => write_report(&mut out, report),
            PaperStatus::Failed { error } => {
                let _ = writeln!(out, "  error: {error}");
            }
            PaperStatus::TimedOut { after_secs } => {
                let _ = writeln!(out, "  timed out after {after_secs}s");
            }
        }
    }
    out
}

fn write_report(out: &mut String, report: &ExtractionReport) {
    if report.outcome != ContextOutcome::KeyNotResolved {
        let keys: Vec<String> = report
            .resolved_keys
            .iter()
            .map(|k| format!("{} ({})", k.key, k.strategy))
            .collect();
        let _ = writeln!(out, "  keys: {}", keys.join(", "));
    }

    let last = report.labels.len().saturating_sub(1);
    for (i, label) in report.labels.iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        if label.macros.is_empty() {
            let _ = writeln!(out, "  {branch} {label}");
        } else {
            let macros: Vec<&str> = label.macros.iter().map(|m| m.as_str()).collect();
            let _ = writeln!(out, "  {branch} {label}  [{}]", macros.join(", "));
        }
    }

    let d = &report.diagnostics;
    if d.skipped_fragments > 0 || d.malformed_bib_records > 0 || !d.inclusion_issues.is_empty() {
        let _ = writeln!(
            out,
            "  ({} skipped fragments, {} malformed bibliography records, {} inclusion issues)",
            d.skipped_fragments,
            d.malformed_bib_records,
            d.inclusion_issues.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellation_common::ExtractionConfig;
    use constellation_extract::{extract_contexts, SourceTree};
    use std::path::PathBuf;

    fn run() -> PaperRun {
        let tree = SourceTree::new("main.tex")
            .with_file("main.tex", r"\section{Intro}\cite{k}\subsection{Method}\citep{k}")
            .with_file("refs.bib", "@misc{k, doi={10.1/xyz}}");
        let target = TargetMetadata { doi: Some("10.1/xyz".to_string()), ..Default::default() };
        let report = extract_contexts(&tree, &target, &ExtractionConfig::default()).unwrap();
        PaperRun { paper: PathBuf::from("papers/one"), status: PaperStatus::Done { report } }
    }

    #[test]
    fn test_text_tree() {
        let target = TargetMetadata { doi: Some("10.1/xyz".to_string()), ..Default::default() };
        let failed = PaperRun {
            paper: PathBuf::from("papers/two"),
            status: PaperStatus::Failed { error: "Source tree is empty".to_string() },
        };
        let text = render_text(&target, &[run(), failed]);
        assert!(text.starts_with("Citation contexts for: 10.1/xyz\n"));
        assert!(text.contains("  keys: k (doi)\n"));
        assert!(text.contains("  ├─ Intro  [cite]\n"));
        assert!(text.contains("  └─ Intro > Method  [citep]\n"));
        assert!(text.contains("papers/two\n  error: Source tree is empty\n"));
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&[run()]).unwrap()).unwrap();
        assert_eq!(json[0]["paper"], "papers/one");
        assert_eq!(json[0]["status"], "done");
        assert_eq!(json[0]["report"]["labels"][1]["text"], "Intro > Method");
    }
}
