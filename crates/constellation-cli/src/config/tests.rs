#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_default_runtime_limits() {
        let runtime = RuntimeConfig {
            max_concurrent_papers: default_max_concurrent_papers(),
            per_paper_timeout_secs: default_per_paper_timeout_secs(),
        };
        assert_eq!(runtime.max_concurrent_papers, 4);
        assert_eq!(runtime.per_paper_timeout_secs, 120);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.extraction, ExtractionConfig::default());
        assert_eq!(config.runtime.max_concurrent_papers, 4);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            "[extraction]\ntitle_overlap_threshold = 0.9\n\n[runtime]\nmax_concurrent_papers = 1\n",
        )
        .unwrap();
        assert_eq!(config.extraction.title_overlap_threshold, 0.9);
        assert_eq!(config.extraction.max_inclusion_depth, 10);
        assert_eq!(config.runtime.max_concurrent_papers, 1);
        assert_eq!(config.runtime.per_paper_timeout_secs, 120);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_toml_str("[runtime]\nmax_concurrent_papers = 0\n").is_err());
        assert!(Config::from_toml_str("[extraction]\ntitle_overlap_threshold = 1.5\n").is_err());
        assert!(Config::from_toml_str("[extraction\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.runtime.per_paper_timeout_secs, 120);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constellation.toml");
        std::fs::write(&path, "[extraction]\nauthor_year_fallback = false\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(!config.extraction.author_year_fallback);
    }
}
