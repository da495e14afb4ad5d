//! Local source-directory loader: reads an unpacked paper into a
//! `SourceTree` and picks its main file.

use std::path::Path;

use anyhow::Context;
use tracing::debug;
use walkdir::WalkDir;

use constellation_common::ExtractionConfig;
use constellation_extract::models::{normalize_path, path_extension};
use constellation_extract::SourceTree;

/// Conventional main-file names, tried in order.
const MAIN_FILE_NAMES: &[&str] = &["main.tex", "ms.tex", "article.tex"];

/// Extensions read besides the configured source and bibliography ones.
const AUXILIARY_EXTENSIONS: &[&str] = &["sty", "cls"];

/// Read every relevant text file under `dir` and choose the entry file.
///
/// `entry` overrides main-file detection and must exist in the tree.
pub fn load_source_tree(dir: &Path, entry: Option<&str>, config: &ExtractionConfig) -> anyhow::Result<SourceTree> {
    if !dir.is_dir() {
        anyhow::bail!("source directory not found: {}", dir.display());
    }

    let mut tree = SourceTree::new("");
    for item in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|item| item.file_type().is_file())
    {
        let rel = item
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("walking {}", dir.display()))?;
        let rel = normalize_path(&rel.to_string_lossy());
        if !wanted(&rel, config) {
            continue;
        }
        let bytes = std::fs::read(item.path()).with_context(|| format!("reading {}", item.path().display()))?;
        tree.insert(&rel, String::from_utf8_lossy(&bytes).into_owned());
    }

    let main = match entry {
        Some(e) => normalize_path(e),
        None => find_main_tex(&tree, config)
            .with_context(|| format!("no LaTeX source found in {}", dir.display()))?,
    };
    debug!(dir = %dir.display(), files = tree.len(), entry = %main, "Loaded source tree");
    tree.set_entry(&main);
    Ok(tree)
}

fn wanted(path: &str, config: &ExtractionConfig) -> bool {
    path_extension(path).is_some_and(|ext| {
        ext.eq_ignore_ascii_case(&config.source_extension)
            || ext.eq_ignore_ascii_case(&config.source_bib_extension)
            || ext.eq_ignore_ascii_case(&config.compiled_bib_extension)
            || AUXILIARY_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a))
    })
}

/// Pick the main file: a conventional name at the top level, else the first
/// file declaring `\documentclass`, else the first source file.
pub fn find_main_tex(tree: &SourceTree, config: &ExtractionConfig) -> Option<String> {
    if let Some(name) = MAIN_FILE_NAMES.iter().find(|n| tree.contains(n)) {
        return Some(name.to_string());
    }

    let sources: Vec<(&str, &str)> = tree
        .files()
        .filter(|(p, _)| path_extension(p).is_some_and(|e| e.eq_ignore_ascii_case(&config.source_extension)))
        .collect();

    sources
        .iter()
        .find(|(_, content)| declares_document_class(content))
        .or_else(|| sources.first())
        .map(|(p, _)| p.to_string())
}

fn declares_document_class(content: &str) -> bool {
    content.lines().any(|line| {
        let code = line.split('%').next().unwrap_or("");
        code.contains("\\documentclass")
    })
}
