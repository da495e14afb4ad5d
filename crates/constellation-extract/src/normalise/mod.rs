//! Text normalisation shared by the bibliography scanner and key resolver.
//! - `text`: LaTeX cleanup, case/punctuation folding, token overlap
//! - `author`: author-name normalisation and comparison

pub mod author;
pub mod text;

pub use author::{find_shared_authors, normalize_author_name, NormalisedAuthor};
pub use text::{clean_latex, contains_phrase, contains_year, jaccard, normalize_for_match, tokens};
