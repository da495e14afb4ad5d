//! constellation-common: Shared types, errors, and configuration used across all Constellation crates.

pub mod error;
pub mod extraction_config;
pub mod target;

// Re-export commonly used types
pub use error::{ConstellationError, Result};
pub use extraction_config::ExtractionConfig;
pub use target::TargetMetadata;
