//! Configuration loading for Constellation.
//! Reads constellation.toml from the current directory or the path in the
//! CONSTELLATION_CONFIG env var. A missing file means defaults.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use constellation_common::ExtractionConfig;

pub const CONFIG_ENV: &str = "CONSTELLATION_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "constellation.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Papers extracted at the same time.
    #[serde(default = "default_max_concurrent_papers")]
    pub max_concurrent_papers: usize,
    /// Wall-clock bound for loading and extracting one paper.
    #[serde(default = "default_per_paper_timeout_secs")]
    pub per_paper_timeout_secs: u64,
}

fn default_max_concurrent_papers()  -> usize { 4 }
fn default_per_paper_timeout_secs() -> u64   { 120 }

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_papers: default_max_concurrent_papers(),
            per_paper_timeout_secs: default_per_paper_timeout_secs(),
        }
    }
}

mod tests;

impl Config {
    /// Load configuration from constellation.toml.
    /// Checks CONSTELLATION_CONFIG first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.extraction.validate()?;
        if self.runtime.max_concurrent_papers == 0 {
            anyhow::bail!("runtime.max_concurrent_papers must be at least 1");
        }
        if self.runtime.per_paper_timeout_secs == 0 {
            anyhow::bail!("runtime.per_paper_timeout_secs must be at least 1");
        }
        Ok(())
    }
}
