//! Metadata describing the target publication whose citations are traced.
//!
//! Produced by whichever provider resolved the user's identifier and shared
//! read-only across every per-paper extraction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConstellationError, Result};

/// The publication being looked up in each citing paper's bibliography.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMetadata {
    #[serde(default)]
    pub title: String,
    /// Author names, first author first. "Surname, Given" is preferred but
    /// "Given Surname" is accepted.
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub arxiv_id: Option<String>,
}

const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "doi:",
];

impl TargetMetadata {
    /// Bare, lowercase DOI with any resolver prefix removed.
    pub fn normalized_doi(&self) -> Option<String> {
        let raw = self.doi.as_deref()?.trim();
        let lower = raw.to_lowercase();
        let mut bare = lower.as_str();
        for prefix in DOI_PREFIXES {
            if let Some(rest) = bare.strip_prefix(prefix) {
                bare = rest.trim();
                break;
            }
        }
        if bare.is_empty() {
            None
        } else {
            Some(bare.to_string())
        }
    }

    /// Lowercase arXiv identifier without version suffix, e.g. `2103.02607`.
    pub fn bare_arxiv_id(&self) -> Option<String> {
        let raw = self.arxiv_id.as_deref()?.trim().to_lowercase();
        let raw = raw
            .strip_prefix("arxiv:")
            .map(str::to_string)
            .unwrap_or(raw);
        let bare = match raw.rfind('v') {
            Some(idx)
                if idx > 0
                    && idx + 1 < raw.len()
                    && raw[idx + 1..].chars().all(|c| c.is_ascii_digit()) =>
            {
                raw[..idx].to_string()
            }
            _ => raw,
        };
        if bare.is_empty() {
            None
        } else {
            Some(bare)
        }
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors
            .iter()
            .map(|a| a.trim())
            .find(|a| !a.is_empty())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConstellationError::Config(format!(
                "unsupported target metadata format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}
