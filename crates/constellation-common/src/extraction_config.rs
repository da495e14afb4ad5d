//! Tunables for the citation-context extraction engine.
//!
//! Loaded from the `[extraction]` table of `constellation.toml`; every field
//! has a default so an empty table (or no file at all) is valid.

use serde::{Deserialize, Serialize};

use crate::error::{ConstellationError, Result};

/// Extraction engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Jaccard word-overlap at or above which a title is accepted.
    /// Observed heuristic, not a derived constant.
    #[serde(default = "default_title_overlap")]
    pub title_overlap_threshold: f64,

    /// Titles with fewer normalised tokens skip the overlap test.
    #[serde(default = "default_min_title_tokens")]
    pub min_title_tokens: usize,

    /// Allow first-author surname + year matching.
    #[serde(default = "default_true")]
    pub author_year_fallback: bool,

    /// Maximum nesting of `\input`/`\include` expansion.
    #[serde(default = "default_max_inclusion_depth")]
    pub max_inclusion_depth: usize,

    /// Extension appended to inclusion targets that have none.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Source-form bibliography extension (BibTeX database).
    #[serde(default = "default_source_bib_extension")]
    pub source_bib_extension: String,

    /// Compiled-form bibliography extension (typeset `thebibliography`).
    #[serde(default = "default_compiled_bib_extension")]
    pub compiled_bib_extension: String,
}

fn default_title_overlap() -> f64 { 0.8 }
fn default_min_title_tokens() -> usize { 2 }
fn default_true() -> bool { true }
fn default_max_inclusion_depth() -> usize { 10 }
fn default_source_extension() -> String { "tex".to_string() }
fn default_source_bib_extension() -> String { "bib".to_string() }
fn default_compiled_bib_extension() -> String { "bbl".to_string() }

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            title_overlap_threshold: default_title_overlap(),
            min_title_tokens: default_min_title_tokens(),
            author_year_fallback: true,
            max_inclusion_depth: default_max_inclusion_depth(),
            source_extension: default_source_extension(),
            source_bib_extension: default_source_bib_extension(),
            compiled_bib_extension: default_compiled_bib_extension(),
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.title_overlap_threshold > 0.0 && self.title_overlap_threshold <= 1.0) {
            return Err(ConstellationError::Config(format!(
                "title_overlap_threshold must be in (0, 1], got {}",
                self.title_overlap_threshold
            )));
        }
        if self.max_inclusion_depth == 0 {
            return Err(ConstellationError::Config(
                "max_inclusion_depth must be at least 1".to_string(),
            ));
        }
        for (name, ext) in [
            ("source_extension", &self.source_extension),
            ("source_bib_extension", &self.source_bib_extension),
            ("compiled_bib_extension", &self.compiled_bib_extension),
        ] {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ConstellationError::Config(format!(
                    "{name} must be a bare extension like \"tex\", got {ext:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = ExtractionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.title_overlap_threshold, 0.8);
        assert_eq!(cfg.source_extension, "tex");
    }

    #[test]
    fn test_empty_toml_table_uses_defaults() {
        let cfg: ExtractionConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, ExtractionConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let cfg: ExtractionConfig =
            toml::from_str("title_overlap_threshold = 0.9\nauthor_year_fallback = false").unwrap();
        assert_eq!(cfg.title_overlap_threshold, 0.9);
        assert!(!cfg.author_year_fallback);
        assert_eq!(cfg.max_inclusion_depth, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cfg = ExtractionConfig { title_overlap_threshold: 1.5, ..Default::default() };
        assert!(cfg.validate().is_err());

        let cfg = ExtractionConfig { max_inclusion_depth: 0, ..Default::default() };
        assert!(cfg.validate().is_err());

        let cfg = ExtractionConfig { source_extension: ".tex".to_string(), ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
