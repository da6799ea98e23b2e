use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::analysis::AnalyzerKind;
use crate::error::{Result, TalkdexError};

/// Analyzer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub kind: AnalyzerKind,
    /// Tokens longer than this (in chars) are skipped
    pub max_token_length: usize,
    /// Stemming never shortens a token below this many chars
    pub min_stem_length: usize,
}

impl AnalyzerConfig {
    pub fn new(kind: AnalyzerKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_max_token_length(mut self, len: usize) -> Self {
        self.max_token_length = len;
        self
    }

    pub fn with_min_stem_length(mut self, len: usize) -> Self {
        self.min_stem_length = len;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_token_length == 0 {
            return Err(TalkdexError::Configuration(
                "max_token_length must be greater than 0".to_string(),
            ));
        }
        if self.min_stem_length == 0 {
            return Err(TalkdexError::Configuration(
                "min_stem_length must be greater than 0".to_string(),
            ));
        }
        if self.min_stem_length > self.max_token_length {
            return Err(TalkdexError::Configuration(format!(
                "min_stem_length {} exceeds max_token_length {}",
                self.min_stem_length, self.max_token_length
            )));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            kind: AnalyzerKind::German,
            max_token_length: 255,
            min_stem_length: 3,
        }
    }
}

/// Index settings configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Analyzer used for fields without an override
    pub analyzer: AnalyzerConfig,
    /// Per-field analyzer overrides
    pub field_analyzers: BTreeMap<String, AnalyzerKind>,
    /// Field searched by unqualified query terms
    pub default_field: String,
    /// Maximum number of hits returned by a search
    pub max_results: usize,
    /// Length of result snippets in chars
    pub snippet_length: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        let mut field_analyzers = BTreeMap::new();
        field_analyzers.insert("path".to_string(), AnalyzerKind::Keyword);
        field_analyzers.insert("date".to_string(), AnalyzerKind::Keyword);
        field_analyzers.insert("category".to_string(), AnalyzerKind::Keyword);

        Self {
            analyzer: AnalyzerConfig::default(),
            field_analyzers,
            default_field: "title".to_string(),
            max_results: 100,
            snippet_length: 160,
        }
    }
}

impl IndexSettings {
    /// Set the analyzer kind for fields without an override
    pub fn with_analyzer(mut self, kind: AnalyzerKind) -> Self {
        self.analyzer.kind = kind;
        self
    }

    /// Override the analyzer for a single field
    pub fn with_field_analyzer(mut self, field: impl Into<String>, kind: AnalyzerKind) -> Self {
        self.field_analyzers.insert(field.into(), kind);
        self
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = field.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.analyzer.validate()?;
        if self.default_field.is_empty() {
            return Err(TalkdexError::Configuration(
                "default_field must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub index_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            index_dir: PathBuf::from("./index"),
        }
    }
}

impl ServerConfig {
    pub fn new(bind_addr: impl Into<String>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            index_dir: index_dir.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let settings = IndexSettings::default();
        assert_eq!(settings.analyzer.kind, AnalyzerKind::German);
        assert_eq!(settings.default_field, "title");
        assert_eq!(
            settings.field_analyzers.get("category"),
            Some(&AnalyzerKind::Keyword)
        );
        assert!(settings.validate().is_ok());

        let server = ServerConfig::default();
        assert_eq!(server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_analyzer_config_validation() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert!(AnalyzerConfig::default()
            .with_max_token_length(0)
            .validate()
            .is_err());
        assert!(AnalyzerConfig::default()
            .with_min_stem_length(0)
            .validate()
            .is_err());
        assert!(AnalyzerConfig::default()
            .with_max_token_length(2)
            .validate()
            .is_err());
    }

    #[test]
    fn test_settings_builder() {
        let settings = IndexSettings::default()
            .with_analyzer(AnalyzerKind::Simple)
            .with_field_analyzer("tag", AnalyzerKind::Keyword)
            .with_default_field("content")
            .with_max_results(5);

        assert_eq!(settings.analyzer.kind, AnalyzerKind::Simple);
        assert_eq!(settings.field_analyzers.get("tag"), Some(&AnalyzerKind::Keyword));
        assert_eq!(settings.default_field, "content");
        assert_eq!(settings.max_results, 5);
    }

    #[test]
    fn test_settings_serde() {
        let settings = IndexSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"german\""));
        let restored: IndexSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.analyzer, settings.analyzer);
    }
}
