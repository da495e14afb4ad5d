//! Data models for the extraction pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::walker::citation::CiteMacro;

// ── Source tree ───────────────────────────────────────────────────────────────

/// All text files of one citing paper, keyed by normalised project-relative
/// path, plus the designated entry file.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    files: BTreeMap<String, String>,
    entry: String,
}

impl SourceTree {
    pub fn new(entry: &str) -> Self {
        Self {
            files: BTreeMap::new(),
            entry: normalize_path(entry),
        }
    }

    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        self.files.insert(normalize_path(path), content.into());
    }

    pub fn with_file(mut self, path: &str, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn set_entry(&mut self, entry: &str) {
        self.entry = normalize_path(entry);
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_path(path)).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }
}

/// Normalise a project-relative path: forward slashes, no `.` segments,
/// `..` resolved lexically, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.trim().split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Extension of the last path segment, if any.
pub fn path_extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

// ── Assembled stream ─────────────────────────────────────────────────────────

/// Byte range of the assembled text that came from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
    pub path: String,
}

/// Comment-free text of the whole document with inclusions spliced in,
/// in source order.
#[derive(Debug, Clone, Default)]
pub struct AssembledStream {
    text: String,
    spans: Vec<SourceSpan>,
}

impl AssembledStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stream from a single in-memory document.
    pub fn from_text(path: &str, text: &str) -> Self {
        let mut stream = Self::new();
        stream.push(path, text);
        stream
    }

    /// Append text attributed to `path`, merging with the previous span when
    /// it came from the same file.
    pub fn push(&mut self, path: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(text);
        let end = self.text.len();
        if let Some(last) = self.spans.last_mut() {
            if last.path == path && last.end == start {
                last.end = end;
                return;
            }
        }
        self.spans.push(SourceSpan { start, end, path: path.to_string() });
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[SourceSpan] {
        &self.spans
    }

    /// File that contributed the byte at `offset`.
    pub fn origin_of(&self, offset: usize) -> Option<&str> {
        let idx = self.spans.partition_point(|s| s.end <= offset);
        self.spans
            .get(idx)
            .filter(|s| s.start <= offset)
            .map(|s| s.path.as_str())
    }
}

// ── Bibliography ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BibOrigin {
    /// Field-based database (`.bib`).
    Source,
    /// Typeset `\bibitem` list (`.bbl`).
    Compiled,
}

impl BibOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            BibOrigin::Source   => "source",
            BibOrigin::Compiled => "compiled",
        }
    }
}

/// One candidate bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibEntry {
    pub key: String,
    /// All descriptive text used for matching.
    pub text: String,
    /// Title field, when the entry is source-form and has one.
    pub title: Option<String>,
    pub origin: BibOrigin,
}

// ── Key resolution ───────────────────────────────────────────────────────────

/// How a key was matched to the target, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Doi,
    Arxiv,
    Title,
    AuthorYear,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Doi        => "doi",
            MatchStrategy::Arxiv      => "arxiv",
            MatchStrategy::Title      => "title",
            MatchStrategy::AuthorYear => "author_year",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedKey {
    pub key: String,
    pub strategy: MatchStrategy,
}

/// Keys judged to denote the target, in bibliography order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedKeySet {
    keys: Vec<ResolvedKey>,
}

impl ResolvedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; if it is already present the stronger strategy is kept.
    pub fn insert(&mut self, key: &str, strategy: MatchStrategy) {
        match self.keys.iter_mut().find(|k| k.key == key) {
            Some(existing) => {
                if strategy < existing.strategy {
                    existing.strategy = strategy;
                }
            }
            None => self.keys.push(ResolvedKey { key: key.to_string(), strategy }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.key == key)
    }

    pub fn strategy_of(&self, key: &str) -> Option<MatchStrategy> {
        self.keys.iter().find(|k| k.key == key).map(|k| k.strategy)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedKey> {
        self.keys.iter()
    }
}

impl FromIterator<(String, MatchStrategy)> for ResolvedKeySet {
    fn from_iter<I: IntoIterator<Item = (String, MatchStrategy)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, strategy) in iter {
            set.insert(&key, strategy);
        }
        set
    }
}

// ── Document structure ───────────────────────────────────────────────────────

/// The three recognised heading depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLevel {
    Section,
    Subsection,
    Subsubsection,
}

impl SectionLevel {
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "section"       => Some(SectionLevel::Section),
            "subsection"    => Some(SectionLevel::Subsection),
            "subsubsection" => Some(SectionLevel::Subsubsection),
            _               => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLevel::Section       => "section",
            SectionLevel::Subsection    => "subsection",
            SectionLevel::Subsubsection => "subsubsection",
        }
    }
}

/// Heading titles currently in effect, outermost first.
///
/// Slots are dense: a heading whose parent level was never opened takes the
/// next free slot, so a subsubsection label never appears without a
/// subsection label before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SectionPath {
    levels: Vec<(SectionLevel, String)>,
}

impl SectionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every heading at `level` or deeper, then open `title` at `level`.
    pub fn enter(&mut self, level: SectionLevel, title: &str) {
        self.levels.retain(|(l, _)| *l < level);
        self.levels.push((level, title.to_string()));
    }

    pub fn section(&self) -> Option<&str> {
        self.slot(0)
    }

    pub fn subsection(&self) -> Option<&str> {
        self.slot(1)
    }

    pub fn subsubsection(&self) -> Option<&str> {
        self.slot(2)
    }

    fn slot(&self, idx: usize) -> Option<&str> {
        self.levels.get(idx).map(|(_, t)| t.as_str())
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|(_, t)| t.as_str())
    }

    /// `"Section > Subsection > Subsubsection"`, skipping empty titles.
    pub fn label(&self) -> Option<String> {
        let parts: Vec<&str> = self.titles().filter(|t| !t.is_empty()).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" > "))
        }
    }
}

/// One qualifying citation occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextRecord {
    pub path: SectionPath,
    #[serde(rename = "macro")]
    pub macro_name: CiteMacro,
    pub key: String,
    /// Byte offset of the macro in the assembled stream.
    pub offset: usize,
}

// ── Presentation labels ──────────────────────────────────────────────────────

pub const NO_CONTEXT_LABEL: &str = "no context found";
pub const UNKNOWN_SECTION_LABEL: &str = "Unknown Section";

/// Human-readable location of one or more citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLabel {
    pub text: String,
    /// Distinct macros that cited the target at this location, first-seen order.
    pub macros: Vec<CiteMacro>,
}

impl ContextLabel {
    pub fn no_context() -> Self {
        Self { text: NO_CONTEXT_LABEL.to_string(), macros: Vec::new() }
    }

    pub fn is_no_context(&self) -> bool {
        self.macros.is_empty() && self.text == NO_CONTEXT_LABEL
    }
}

impl fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
