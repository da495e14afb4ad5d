//! Structure walker: attributes every citation of a resolved key to the
//! heading path in effect at that point.
//!
//! Traversal is pre-order, depth-first, left to right, i.e. reading order.
//! The current heading path lives in a `WalkCursor` threaded through the
//! traversal; nothing is shared between walks.

pub mod citation;
pub mod tree;

use tracing::debug;

use crate::models::{AssembledStream, ContextRecord, ResolvedKeySet, SectionPath};

use self::tree::Node;

/// Records plus skipped-fragment diagnostics for one walk.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    pub records: Vec<ContextRecord>,
    pub skipped_fragments: usize,
    /// Stream offsets of the skipped fragments.
    pub skipped_at: Vec<usize>,
}

pub fn walk(stream: &AssembledStream, keys: &ResolvedKeySet) -> WalkOutput {
    let doc = tree::parse(stream.as_str());

    let mut cursor = WalkCursor {
        path: SectionPath::new(),
        keys,
        records: Vec::new(),
    };
    cursor.visit(&doc.nodes);

    for &offset in &doc.skipped {
        debug!(
            offset,
            file = stream.origin_of(offset).unwrap_or("<unknown>"),
            "Skipped malformed fragment"
        );
    }

    WalkOutput {
        records: cursor.records,
        skipped_fragments: doc.skipped.len(),
        skipped_at: doc.skipped,
    }
}

struct WalkCursor<'k> {
    path: SectionPath,
    keys: &'k ResolvedKeySet,
    records: Vec<ContextRecord>,
}

impl WalkCursor<'_> {
    fn visit(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Section { level, title, children, .. } => {
                    self.path.enter(*level, title);
                    self.visit(children);
                }
                Node::Citation { macro_name, keys, offset } => {
                    for key in keys.iter().filter(|k| self.keys.contains(k)) {
                        self.records.push(ContextRecord {
                            path: self.path.clone(),
                            macro_name: *macro_name,
                            key: key.clone(),
                            offset: *offset,
                        });
                    }
                }
                Node::Group { children, .. } => self.visit(children),
                Node::Text(_) | Node::Command { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStrategy;
    use crate::walker::citation::CiteMacro;

    fn keys(list: &[&str]) -> ResolvedKeySet {
        list.iter().map(|k| (k.to_string(), MatchStrategy::Doi)).collect()
    }

    fn walk_text(text: &str, resolved: &[&str]) -> WalkOutput {
        walk(&AssembledStream::from_text("main.tex", text), &keys(resolved))
    }

    fn labels(out: &WalkOutput) -> Vec<(Option<String>, CiteMacro)> {
        out.records.iter().map(|r| (r.path.label(), r.macro_name)).collect()
    }

    #[test]
    fn test_reference_scenario() {
        let out = walk_text(
            r"\section{Intro} text \cite{ABC99} more \subsection{Method} \citep{ABC99,OTHER}",
            &["ABC99"],
        );
        assert_eq!(
            labels(&out),
            vec![
                (Some("Intro".to_string()), CiteMacro::Cite),
                (Some("Intro > Method".to_string()), CiteMacro::Citep),
            ]
        );
        assert_eq!(out.skipped_fragments, 0);
    }

    #[test]
    fn test_one_record_per_matching_key_in_list() {
        let out = walk_text(r"\section{S}\cite{x, K, y, z}", &["K"]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].key, "K");

        let aliases = walk_text(r"\section{S}\cite{K1,other,K2}", &["K1", "K2"]);
        assert_eq!(aliases.records.len(), 2);
    }

    #[test]
    fn test_heading_omitted_level_stays_nested() {
        let out = walk_text(
            r"\section{A}\subsubsection{C}\cite{k}\subsection{B}\subsubsection{D}\cite{k}",
            &["k"],
        );
        let paths: Vec<_> = out.records.iter().map(|r| r.path.clone()).collect();
        for p in &paths {
            if p.subsubsection().is_some() {
                assert!(p.subsection().is_some());
            }
        }
        assert_eq!(paths[0].label().as_deref(), Some("A > C"));
        assert_eq!(paths[1].label().as_deref(), Some("A > B > D"));
    }

    #[test]
    fn test_citation_before_any_heading_has_empty_path() {
        let out = walk_text(r"\begin{abstract}\cite{k}\end{abstract}\section{X}", &["k"]);
        assert_eq!(out.records.len(), 1);
        assert!(out.records[0].path.is_empty());
    }

    #[test]
    fn test_snapshot_is_by_value() {
        let out = walk_text(r"\section{One}\cite{k}\section{Two}\cite{k}", &["k"]);
        assert_eq!(out.records[0].path.label().as_deref(), Some("One"));
        assert_eq!(out.records[1].path.label().as_deref(), Some("Two"));
    }

    #[test]
    fn test_empty_key_set_emits_nothing() {
        let out = walk_text(r"\section{S}\cite{k}", &[]);
        assert!(out.records.is_empty());
    }

    #[test]
    fn test_malformed_fragments_are_counted_not_fatal() {
        let out = walk_text(r"\section{S} } \cite{k \subsection{T}\cite{k}", &["k"]);
        assert_eq!(labels(&out), vec![(Some("S > T".to_string()), CiteMacro::Cite)]);
        assert!(out.skipped_fragments >= 2);
        assert_eq!(out.skipped_at.len(), out.skipped_fragments);
    }

    #[test]
    fn test_nocite_is_not_an_occurrence() {
        let out = walk_text(r"\section{S}\nocite{k}", &["k"]);
        assert!(out.records.is_empty());
    }

    #[test]
    fn test_cite_with_pre_and_post_notes_is_attributed() {
        let out = walk_text(r"\section{Intro} \cite[e.g.][p.~3]{k}", &["k"]);
        assert_eq!(labels(&out), vec![(Some("Intro".to_string()), CiteMacro::Cite)]);
        assert_eq!(out.skipped_fragments, 0);
    }

    #[test]
    fn test_deeply_nested_groups_still_yield_records() {
        let text = format!(r"\section{{A}}{}\cite{{k}}{}", "{".repeat(10_000), "}".repeat(10_000));
        let out = walk_text(&text, &["k"]);
        assert_eq!(labels(&out), vec![(Some("A".to_string()), CiteMacro::Cite)]);
        assert_eq!(out.skipped_fragments, 1);
    }
}
