//! Bibliography scanner: collects candidate entries from every source-form
//! (`.bib`) and compiled (`.bbl`) file of a paper.
//!
//! Files are read in path order. Within source files a repeated key keeps
//! its last definition. A compiled entry replaces a source entry with the
//! same key, since it reflects what was actually typeset.

pub mod bbl;
pub mod bibtex;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use constellation_common::ExtractionConfig;

use crate::assembler::strip_comments;
use crate::models::{path_extension, BibEntry, BibOrigin, SourceTree};

/// Candidate entries plus the number of records that could not be read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BibliographyScan {
    pub entries: Vec<BibEntry>,
    pub malformed: usize,
}

impl BibliographyScan {
    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace by key, keeping first-seen position.
    fn upsert(&mut self, index: &mut HashMap<String, usize>, entry: BibEntry) {
        match index.get(&entry.key) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

#[instrument(skip_all, fields(files = tree.len()))]
pub fn scan(tree: &SourceTree, config: &ExtractionConfig) -> BibliographyScan {
    let mut source = Vec::new();
    let mut compiled = Vec::new();
    let mut malformed = 0;

    for (path, content) in tree.files() {
        let Some(ext) = path_extension(path) else { continue };
        if ext.eq_ignore_ascii_case(&config.source_bib_extension) {
            let parsed = bibtex::parse(content);
            debug!(path, entries = parsed.entries.len(), malformed = parsed.malformed, "Read source bibliography");
            malformed += parsed.malformed;
            source.extend(parsed.entries);
        } else if ext.eq_ignore_ascii_case(&config.compiled_bib_extension) {
            let parsed = bbl::parse(&strip_comments(content));
            debug!(path, entries = parsed.entries.len(), malformed = parsed.malformed, "Read compiled bibliography");
            malformed += parsed.malformed;
            compiled.extend(parsed.entries);
        }
    }

    let mut scan = BibliographyScan { entries: Vec::new(), malformed };
    let mut index = HashMap::new();
    for entry in source.into_iter().chain(compiled) {
        scan.upsert(&mut index, entry);
    }

    debug!(
        entries = scan.entries.len(),
        compiled = scan.entries.iter().filter(|e| e.origin == BibOrigin::Compiled).count(),
        malformed = scan.malformed,
        "Bibliography scanned"
    );
    scan
}
