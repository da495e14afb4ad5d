//! Source assembler: splices `\input`/`\include`/`\subfile` targets into one
//! comment-free stream, depth-first from the entry file.
//!
//! Cycle detection is scoped to the current inclusion stack, so the same file
//! may still be included from two separate branches.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use constellation_common::{ConstellationError, ExtractionConfig, Result};

use crate::models::{normalize_path, path_extension, AssembledStream, SourceTree};

/// A recoverable inclusion problem. The offending directive is dropped and
/// assembly continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InclusionIssue {
    #[error("included file `{target}` not found (from {from})")]
    MissingFile { from: String, target: String },

    #[error("inclusion cycle broken: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("inclusion of `{target}` from {from} exceeds depth {depth}")]
    DepthExceeded { from: String, target: String, depth: usize },
}

/// Result of assembling one paper.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub stream: AssembledStream,
    pub issues: Vec<InclusionIssue>,
}

/// Assemble `tree` starting at `entry`.
///
/// Fails only when the tree is empty or the entry file is absent.
pub fn assemble(tree: &SourceTree, entry: &str, config: &ExtractionConfig) -> Result<Assembly> {
    if tree.is_empty() {
        return Err(ConstellationError::EmptySourceTree);
    }
    let entry = normalize_path(entry);
    let content = tree
        .get(&entry)
        .ok_or_else(|| ConstellationError::MissingEntry(entry.clone()))?;

    let mut assembler = Assembler {
        tree,
        config,
        stack: Vec::new(),
        stream: AssembledStream::new(),
        issues: Vec::new(),
    };
    assembler.expand(&entry, content, 0);

    debug!(
        entry = %entry,
        bytes = assembler.stream.as_str().len(),
        files = assembler.stream.spans().len(),
        issues = assembler.issues.len(),
        "Assembled source"
    );

    Ok(Assembly {
        stream: assembler.stream,
        issues: assembler.issues,
    })
}

struct Assembler<'a> {
    tree: &'a SourceTree,
    config: &'a ExtractionConfig,
    stack: Vec<String>,
    stream: AssembledStream,
    issues: Vec<InclusionIssue>,
}

impl<'a> Assembler<'a> {
    fn expand(&mut self, path: &str, content: &str, depth: usize) {
        self.stack.push(path.to_string());
        let clean = strip_comments(content);
        let tree = self.tree;

        let mut cursor = 0;
        for caps in inclusion_regex().captures_iter(&clean) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            if is_escaped(&clean, whole.start()) {
                continue;
            }
            self.stream.push(path, &clean[cursor..whole.start()]);
            cursor = whole.end();

            let raw_target = target.as_str().trim();
            let Some(resolved) = self.locate(path, raw_target) else {
                warn!(from = %path, target = %raw_target, "Included file not found, skipping");
                self.issues.push(InclusionIssue::MissingFile {
                    from: path.to_string(),
                    target: raw_target.to_string(),
                });
                continue;
            };

            if let Some(pos) = self.stack.iter().position(|p| *p == resolved) {
                let mut chain = self.stack[pos..].to_vec();
                chain.push(resolved.clone());
                warn!(chain = %chain.join(" -> "), "Inclusion cycle, skipping repeated file");
                self.issues.push(InclusionIssue::Cycle { chain });
                continue;
            }

            if depth + 1 > self.config.max_inclusion_depth {
                warn!(from = %path, target = %resolved, "Inclusion depth limit reached");
                self.issues.push(InclusionIssue::DepthExceeded {
                    from: path.to_string(),
                    target: resolved,
                    depth: self.config.max_inclusion_depth,
                });
                continue;
            }

            if let Some(included) = tree.get(&resolved) {
                self.expand(&resolved, included, depth + 1);
            }
        }
        self.stream.push(path, &clean[cursor..]);
        self.stack.pop();
    }

    /// Find the tree path for an inclusion target, trying the project root
    /// first and then the including file's directory.
    fn locate(&self, from: &str, raw: &str) -> Option<String> {
        let mut bases = vec![normalize_path(raw)];
        if let Some((dir, _)) = from.rsplit_once('/') {
            bases.push(normalize_path(&format!("{dir}/{raw}")));
        }

        let ext = &self.config.source_extension;
        for base in bases {
            if base.is_empty() {
                continue;
            }
            let mut candidates = Vec::with_capacity(2);
            match path_extension(&base) {
                None => candidates.push(format!("{base}.{ext}")),
                Some(e) if e == ext.as_str() => candidates.push(base.clone()),
                Some(_) => {
                    candidates.push(base.clone());
                    candidates.push(format!("{base}.{ext}"));
                }
            }
            if let Some(found) = candidates.into_iter().find(|c| self.tree.contains(c)) {
                return Some(found);
            }
        }
        None
    }
}

fn inclusion_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(input|include|subfile)\s*\{([^{}]*)\}").expect("valid inclusion regex")
    })
}

/// True when the byte at `idx` is preceded by an odd run of backslashes.
pub(crate) fn is_escaped(text: &str, idx: usize) -> bool {
    let run = text.as_bytes()[..idx]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

/// Remove `%` comments through end of line. `\%` is literal and kept.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let cut = line
            .as_bytes()
            .iter()
            .enumerate()
            .find(|&(idx, &b)| b == b'%' && !is_escaped(line, idx))
            .map(|(idx, _)| idx);
        match cut {
            Some(idx) => {
                out.push_str(&line[..idx]);
                if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str(line),
        }
    }
    out
}
