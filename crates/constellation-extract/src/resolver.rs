//! Key resolver: decides which bibliography keys denote the target paper.
//!
//! Each entry is tried against the strategies strongest first (DOI, arXiv
//! id, title, first author + year) and contributes at most one reason.
//! Distinct entries are judged independently, so several keys may match.

use tracing::debug;

use constellation_common::{ExtractionConfig, TargetMetadata};

use crate::models::{BibEntry, MatchStrategy, ResolvedKeySet};
use crate::normalise::{contains_phrase, contains_year, jaccard, normalize_author_name, normalize_for_match, tokens};

/// Target metadata reduced to the forms compared against entries.
/// Built once per resolution.
struct TargetProbe {
    doi: Option<String>,
    arxiv: Option<String>,
    title: Option<String>,
    title_tokens: usize,
    surname: Option<String>,
    year: Option<i32>,
}

impl TargetProbe {
    fn new(target: &TargetMetadata) -> Self {
        let title = Some(normalize_for_match(&target.title)).filter(|t| !t.is_empty());
        let title_tokens = title.as_deref().map_or(0, |t| tokens(t).len());
        let surname = target
            .first_author()
            .and_then(normalize_author_name)
            .map(|a| normalize_for_match(&a.surname))
            .filter(|s| !s.is_empty());
        Self {
            doi: target.normalized_doi(),
            arxiv: target.bare_arxiv_id(),
            title,
            title_tokens,
            surname,
            year: target.year,
        }
    }
}

/// Resolve the keys that refer to `target`. Pure and deterministic; an
/// empty set is a valid outcome.
pub fn resolve(entries: &[BibEntry], target: &TargetMetadata, config: &ExtractionConfig) -> ResolvedKeySet {
    let probe = TargetProbe::new(target);
    let mut resolved = ResolvedKeySet::new();

    for entry in entries {
        if let Some(strategy) = match_entry(entry, &probe, config) {
            debug!(key = %entry.key, strategy = %strategy, origin = entry.origin.as_str(), "Resolved key");
            resolved.insert(&entry.key, strategy);
        }
    }
    resolved
}

fn match_entry(entry: &BibEntry, probe: &TargetProbe, config: &ExtractionConfig) -> Option<MatchStrategy> {
    let lower = entry.text.to_lowercase();

    if probe.doi.as_deref().is_some_and(|doi| lower.contains(doi)) {
        return Some(MatchStrategy::Doi);
    }
    if probe.arxiv.as_deref().is_some_and(|id| contains_identifier(&lower, id)) {
        return Some(MatchStrategy::Arxiv);
    }

    let normalised = normalize_for_match(&entry.text);
    if let Some(title) = probe.title.as_deref() {
        if title_matches(title, probe.title_tokens, entry, &normalised, config) {
            return Some(MatchStrategy::Title);
        }
    }

    if config.author_year_fallback {
        if let (Some(surname), Some(year)) = (probe.surname.as_deref(), probe.year) {
            if contains_phrase(&normalised, surname) && contains_year(&lower, year) {
                return Some(MatchStrategy::AuthorYear);
            }
        }
    }
    None
}

fn title_matches(
    title: &str,
    title_tokens: usize,
    entry: &BibEntry,
    normalised_text: &str,
    config: &ExtractionConfig,
) -> bool {
    if contains_phrase(normalised_text, title) {
        return true;
    }
    if title_tokens < config.min_title_tokens {
        return false;
    }
    let candidate = match entry.title.as_deref() {
        Some(t) => normalize_for_match(t),
        None => normalised_text.to_string(),
    };
    jaccard(title, &candidate) >= config.title_overlap_threshold
}

/// Substring test that refuses matches running into further digits, so
/// `2103.0260` does not match inside `2103.02607`.
fn contains_identifier(text: &str, id: &str) -> bool {
    let bytes = text.as_bytes();
    text.match_indices(id).any(|(idx, m)| {
        let before = idx.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(idx + m.len()).copied();
        !before.is_some_and(|b| b.is_ascii_digit()) && !after.is_some_and(|b| b.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BibOrigin;

    fn entry(key: &str, text: &str, title: Option<&str>) -> BibEntry {
        BibEntry {
            key: key.to_string(),
            text: text.to_string(),
            title: title.map(str::to_string),
            origin: BibOrigin::Source,
        }
    }

    fn target() -> TargetMetadata {
        TargetMetadata {
            title: "A Study of X".to_string(),
            authors: vec!["Smith, John".to_string()],
            year: Some(2019),
            doi: Some("10.1/xyz".to_string()),
            arxiv_id: None,
        }
    }

    #[test]
    fn test_reference_doi_scenario() {
        let entries = vec![entry("ABC99", "... doi:10.1/xyz ...", None)];
        let target = TargetMetadata { doi: Some("10.1/xyz".to_string()), ..Default::default() };
        let keys = resolve(&entries, &target, &ExtractionConfig::default());
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.strategy_of("ABC99"), Some(MatchStrategy::Doi));
    }

    #[test]
    fn test_doi_takes_precedence_over_non_matching_title() {
        let entries = vec![entry("k", "Completely Different Title. DOI 10.1/XYZ", Some("Completely Different Title"))];
        let keys = resolve(&entries, &target(), &ExtractionConfig::default());
        assert_eq!(keys.strategy_of("k"), Some(MatchStrategy::Doi));
    }

    #[test]
    fn test_doi_given_as_resolver_url() {
        let target = TargetMetadata { doi: Some("https://doi.org/10.1/XYZ".to_string()), ..Default::default() };
        let keys = resolve(&[entry("k", "see 10.1/xyz", None)], &target, &ExtractionConfig::default());
        assert_eq!(keys.strategy_of("k"), Some(MatchStrategy::Doi));
    }

    #[test]
    fn test_title_match_despite_case_and_punctuation() {
        let target = TargetMetadata { title: "A Study of X".to_string(), ..Default::default() };
        let keys = resolve(&[entry("k", "A study of X.", None)], &target, &ExtractionConfig::default());
        assert_eq!(keys.strategy_of("k"), Some(MatchStrategy::Title));
    }

    #[test]
    fn test_title_overlap_threshold() {
        let target = TargetMetadata {
            title: "Stellar populations in nearby dwarf galaxies revisited".to_string(),
            ..Default::default()
        };
        let close = entry(
            "close",
            "Jones 2001 Stellar populations of nearby dwarf galaxies revisited",
            Some("Stellar populations of nearby dwarf galaxies revisited"),
        );
        let far = entry("far", "Unrelated", Some("Gas dynamics in dwarf galaxies"));
        let config = ExtractionConfig { title_overlap_threshold: 0.7, ..Default::default() };
        let keys = resolve(&[close, far], &target, &config);
        assert!(keys.contains("close"));
        assert!(!keys.contains("far"));
    }

    #[test]
    fn test_short_title_skips_overlap_but_not_phrase() {
        let target = TargetMetadata { title: "Gaia".to_string(), ..Default::default() };
        let keys = resolve(
            &[entry("phrase", "The Gaia mission", None), entry("other", "Hipparcos", Some("Hipparcos"))],
            &target,
            &ExtractionConfig::default(),
        );
        assert!(keys.contains("phrase"));
        assert!(!keys.contains("other"));
    }

    #[test]
    fn test_arxiv_ranks_between_doi_and_title() {
        let target = TargetMetadata {
            title: "A Study of X".to_string(),
            arxiv_id: Some("arXiv:2103.02607v2".to_string()),
            ..Default::default()
        };
        let entries = vec![
            entry("arx", "A Study of X, arXiv:2103.02607", None),
            entry("prefix", "arXiv:2103.026071", None),
        ];
        let keys = resolve(&entries, &target, &ExtractionConfig::default());
        assert_eq!(keys.strategy_of("arx"), Some(MatchStrategy::Arxiv));
        assert!(!keys.contains("prefix"));
    }

    #[test]
    fn test_author_year_fallback_and_toggle() {
        let target = TargetMetadata {
            title: "Unrelated words entirely".to_string(),
            authors: vec!["John Smith".to_string()],
            year: Some(2019),
            ..Default::default()
        };
        let entries = vec![
            entry("hit", "J. Smith, ApJ 870, 2019", None),
            entry("wrong_year", "J. Smith, ApJ 870, 2018", None),
            entry("wrong_name", "J. Smithson, ApJ 870, 2019", None),
        ];
        let keys = resolve(&entries, &target, &ExtractionConfig::default());
        assert_eq!(keys.strategy_of("hit"), Some(MatchStrategy::AuthorYear));
        assert_eq!(keys.len(), 1);

        let off = ExtractionConfig { author_year_fallback: false, ..Default::default() };
        assert!(resolve(&entries, &target, &off).is_empty());
    }

    #[test]
    fn test_multiple_keys_kept_with_their_own_strategy() {
        let entries = vec![
            entry("by_doi", "10.1/xyz", None),
            entry("by_title", "Smith J., A study of X, 2019", None),
            entry("none", "Other paper, 2020", None),
        ];
        let keys = resolve(&entries, &target(), &ExtractionConfig::default());
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.strategy_of("by_doi"), Some(MatchStrategy::Doi));
        assert_eq!(keys.strategy_of("by_title"), Some(MatchStrategy::Title));
    }

    #[test]
    fn test_target_without_usable_metadata_resolves_nothing() {
        let keys = resolve(&[entry("k", "anything 2019", None)], &TargetMetadata::default(), &ExtractionConfig::default());
        assert!(keys.is_empty());
    }
}
