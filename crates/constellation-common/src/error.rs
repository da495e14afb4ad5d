use thiserror::Error;

/// Hard failures for a single citing paper.
///
/// Structural problems inside a paper (missing inclusion targets, cycles,
/// unbalanced braces) are recovered locally and never surface here.
#[derive(Debug, Error)]
pub enum ConstellationError {
    #[error("Source tree is empty")]
    EmptySourceTree,

    #[error("Entry file not found in source tree: {0}")]
    MissingEntry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConstellationError {
    /// Input-validity failures are specific to one paper's source tree.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConstellationError::EmptySourceTree | ConstellationError::MissingEntry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConstellationError>;
