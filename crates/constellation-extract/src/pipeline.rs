//! End-to-end citation-context extraction for one citing paper.
//!
//! Runs the strict chain:
//!   1. Assemble the source tree from its entry file
//!   2. Scan every bibliography file for candidate entries
//!   3. Resolve which keys denote the target
//!   4. Walk the document and record each citation of those keys
//!   5. Aggregate records into presentation labels
//!
//! The chain is synchronous and holds no shared state, so callers may run
//! many papers concurrently against the same `TargetMetadata`.

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use constellation_common::{ExtractionConfig, Result, TargetMetadata};

use crate::aggregator::aggregate;
use crate::assembler::assemble;
use crate::bibliography;
use crate::models::{ContextLabel, ResolvedKeySet, SourceTree};
use crate::resolver::resolve;
use crate::walker::walk;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// How extraction ended for a paper. None of these is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextOutcome {
    /// No bibliography entry matched the target.
    KeyNotResolved,
    /// A key matched but is never cited in the text (e.g. only `\nocite`).
    NoInTextUsage,
    /// At least one in-text citation was located.
    Found,
}

impl ContextOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextOutcome::KeyNotResolved => "key_not_resolved",
            ContextOutcome::NoInTextUsage  => "no_in_text_usage",
            ContextOutcome::Found          => "found",
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Informational counters gathered along the chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub inclusion_issues: Vec<String>,
    pub skipped_fragments: usize,
    pub bib_entries: usize,
    pub malformed_bib_records: usize,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub run_id: Uuid,
    pub entry: String,
    pub outcome: ContextOutcome,
    /// Never empty: holds the "no context found" sentinel when nothing was located.
    pub labels: Vec<ContextLabel>,
    pub resolved_keys: ResolvedKeySet,
    pub diagnostics: Diagnostics,
    pub duration_ms: u64,
}

impl ExtractionReport {
    pub fn label_texts(&self) -> Vec<&str> {
        self.labels.iter().map(|l| l.text.as_str()).collect()
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Extract citation contexts of `target` from one paper's source tree.
///
/// Hard failures are limited to invalid input (empty tree, missing entry
/// file) and invalid configuration. Structural problems are recovered and
/// reported in `diagnostics`.
#[instrument(skip(tree, target, config), fields(entry = %tree.entry(), run_id = tracing::field::Empty))]
pub fn extract_contexts(
    tree: &SourceTree,
    target: &TargetMetadata,
    config: &ExtractionConfig,
) -> Result<ExtractionReport> {
    config.validate()?;
    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));
    let t0 = std::time::Instant::now();

    // ── 1. Assemble ──────────────────────────────────────────────────────────
    let assembly = assemble(tree, tree.entry(), config)?;
    for issue in &assembly.issues {
        warn!(issue = %issue, "Inclusion skipped");
    }

    // ── 2. Scan bibliographies ───────────────────────────────────────────────
    let scan = bibliography::scan(tree, config);
    if scan.malformed > 0 {
        warn!(malformed = scan.malformed, "Skipped malformed bibliography records");
    }

    // ── 3. Resolve keys ──────────────────────────────────────────────────────
    let resolved = resolve(&scan.entries, target, config);

    let mut diagnostics = Diagnostics {
        inclusion_issues: assembly.issues.iter().map(ToString::to_string).collect(),
        skipped_fragments: 0,
        bib_entries: scan.entries.len(),
        malformed_bib_records: scan.malformed,
        records: 0,
    };

    if resolved.is_empty() {
        info!(bib_entries = scan.entries.len(), "No bibliography key matches the target");
        return Ok(ExtractionReport {
            run_id,
            entry: tree.entry().to_string(),
            outcome: ContextOutcome::KeyNotResolved,
            labels: vec![ContextLabel::no_context()],
            resolved_keys: resolved,
            diagnostics,
            duration_ms: t0.elapsed().as_millis() as u64,
        });
    }

    // ── 4. Walk ──────────────────────────────────────────────────────────────
    let walked = walk(&assembly.stream, &resolved);
    diagnostics.skipped_fragments = walked.skipped_fragments;
    diagnostics.records = walked.records.len();
    if walked.skipped_fragments > 0 {
        warn!(skipped = walked.skipped_fragments, "Skipped malformed fragments while walking");
    }

    // ── 5. Aggregate ─────────────────────────────────────────────────────────
    let labels = aggregate(&walked.records);
    let outcome = if walked.records.is_empty() {
        ContextOutcome::NoInTextUsage
    } else {
        ContextOutcome::Found
    };

    info!(
        keys = resolved.len(),
        records = walked.records.len(),
        labels = labels.len(),
        outcome = outcome.as_str(),
        "Extraction complete"
    );

    Ok(ExtractionReport {
        run_id,
        entry: tree.entry().to_string(),
        outcome,
        labels,
        resolved_keys: resolved,
        diagnostics,
        duration_ms: t0.elapsed().as_millis() as u64,
    })
}
