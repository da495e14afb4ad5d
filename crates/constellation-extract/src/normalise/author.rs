//! Author-name normalisation and comparison.
//!
//! Accepts "Last, First" and "First Last" forms, LaTeX-escaped accents,
//! initials and lowercase surname particles ("van der Berg").

use std::collections::HashSet;

use super::text::{clean_latex, fold_diacritic};

/// Surname particles kept with the surname in "First Last" form.
const PARTICLES: &[&str] = &["van", "von", "der", "den", "de", "del", "della", "di", "da", "du", "la", "le", "dos", "das"];

/// Comparable form of an author name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalisedAuthor {
    /// Lowercase surname, particles included, e.g. "van der berg".
    pub surname: String,
    /// Lowercase first initial, empty when no given name was present.
    pub initial: String,
}

/// Normalise an author name to `(surname, first initial)`.
///
/// Returns `None` when no surname can be recovered.
pub fn normalize_author_name(author: &str) -> Option<NormalisedAuthor> {
    let cleaned: String = clean_latex(author).chars().map(fold_diacritic).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let (surname, given) = match cleaned.split_once(',') {
        Some((last, first)) => (last.trim().to_string(), first.trim().to_string()),
        None => {
            let words: Vec<&str> = cleaned.split_whitespace().collect();
            match words.as_slice() {
                [] => return None,
                [only] => (only.to_string(), String::new()),
                _ => {
                    // Walk back over lowercase particles preceding the last word.
                    let mut start = words.len() - 1;
                    while start > 1 && PARTICLES.contains(&words[start - 1]) {
                        start -= 1;
                    }
                    (words[start..].join(" "), words[0].to_string())
                }
            }
        }
    };

    let surname: String = surname
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'' || *c == '-')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if surname.is_empty() {
        return None;
    }

    let initial = given
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_lowercase().collect::<String>())
        .unwrap_or_default();

    Some(NormalisedAuthor { surname, initial })
}

/// Authors of `citing` that also appear in `root`, compared on
/// `(surname, first initial)`. Returned in `citing` order as written.
pub fn find_shared_authors(root: &[String], citing: &[String]) -> Vec<String> {
    if root.is_empty() || citing.is_empty() {
        return Vec::new();
    }
    let root_set: HashSet<NormalisedAuthor> =
        root.iter().filter_map(|a| normalize_author_name(a)).collect();

    citing
        .iter()
        .filter(|a| normalize_author_name(a).is_some_and(|n| root_set.contains(&n)))
        .cloned()
        .collect()
}
