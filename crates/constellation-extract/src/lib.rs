//! constellation-extract: Citation-context extraction engine.
//! Given a citing paper's LaTeX sources and metadata for a target paper:
//! - Source assembly (`\input`/`\include`/`\subfile`, comments stripped)
//! - Bibliography scanning (BibTeX databases and compiled `.bbl` lists)
//! - Key resolution (DOI, arXiv id, title, author + year)
//! - Structure walking (section path at every citation of the target)
//! - Aggregation into presentation labels

pub mod aggregator;
pub mod assembler;
pub mod bibliography;
pub mod models;
pub mod normalise;
pub mod pipeline;
pub mod resolver;
pub mod syntax;
pub mod walker;

pub use aggregator::aggregate;
pub use assembler::{assemble, Assembly, InclusionIssue};
pub use bibliography::{scan, BibliographyScan};
pub use models::{
    AssembledStream, BibEntry, BibOrigin, ContextLabel, ContextRecord, MatchStrategy,
    ResolvedKeySet, SectionLevel, SectionPath, SourceTree,
};
pub use pipeline::{extract_contexts, ContextOutcome, Diagnostics, ExtractionReport};
pub use resolver::resolve;
pub use walker::{citation::CiteMacro, walk, WalkOutput};
