use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

use super::normalizer::normalize_german;
use super::stemmer::GermanLightStemmer;
use super::tokenizer::Tokenizer;
use crate::config::{AnalyzerConfig, IndexSettings};
use crate::error::{Result, TalkdexError};

/// The closed set of analyzer configurations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// Tokenize only
    Standard,
    /// Tokenize + lowercase
    Simple,
    /// Tokenize + lowercase + German normalization + light stemming
    GermanLight,
    /// Like `GermanLight`, with German stop words removed after lowercasing
    German,
    /// Whole value as a single, unmodified term
    Keyword,
}

impl AnalyzerKind {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerKind::Standard => "standard",
            AnalyzerKind::Simple => "simple",
            AnalyzerKind::GermanLight => "german_light",
            AnalyzerKind::German => "german",
            AnalyzerKind::Keyword => "keyword",
        }
    }
}

impl std::str::FromStr for AnalyzerKind {
    type Err = TalkdexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(AnalyzerKind::Standard),
            "simple" => Ok(AnalyzerKind::Simple),
            "german_light" => Ok(AnalyzerKind::GermanLight),
            "german" => Ok(AnalyzerKind::German),
            "keyword" => Ok(AnalyzerKind::Keyword),
            other => Err(TalkdexError::Configuration(format!(
                "unknown analyzer '{}'",
                other
            ))),
        }
    }
}

/// Normalized unit of searchable text
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term(String);

impl Term {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<&str> for Term {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A term together with where it came from in the source text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub term: Term,
    /// Token position; removed stop words still consume a position
    pub position: u32,
    /// Byte offsets into the analyzed text
    pub start: usize,
    pub end: usize,
}

fn german_stopwords() -> &'static HashSet<String> {
    static STOPWORDS: OnceLock<HashSet<String>> = OnceLock::new();
    STOPWORDS.get_or_init(|| {
        get(LANGUAGE::German)
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect()
    })
}

/// Text analyzer: tokenizer followed by the filters of its kind
#[derive(Clone, Debug)]
pub struct Analyzer {
    kind: AnalyzerKind,
    tokenizer: Tokenizer,
    lowercase: bool,
    remove_stopwords: bool,
    normalize: bool,
    stemmer: Option<GermanLightStemmer>,
}

impl Analyzer {
    /// Build an analyzer from configuration, validating its limits
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Analyzer of the given kind with default limits
    pub fn of(kind: AnalyzerKind) -> Self {
        Self::build(&AnalyzerConfig::new(kind))
    }

    fn build(config: &AnalyzerConfig) -> Self {
        let kind = config.kind;
        let (lowercase, remove_stopwords, normalize, stem) = match kind {
            AnalyzerKind::Standard | AnalyzerKind::Keyword => (false, false, false, false),
            AnalyzerKind::Simple => (true, false, false, false),
            AnalyzerKind::GermanLight => (true, false, true, true),
            AnalyzerKind::German => (true, true, true, true),
        };

        Self {
            kind,
            tokenizer: Tokenizer::new(config.max_token_length),
            lowercase,
            remove_stopwords,
            normalize,
            stemmer: stem.then(|| GermanLightStemmer::new(config.min_stem_length)),
        }
    }

    pub fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    /// Analyze text into tokens with positions and offsets
    pub fn tokens<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Token> + 'a> {
        if self.kind == AnalyzerKind::Keyword {
            let token = (!text.is_empty()).then(|| Token {
                term: Term::new(text),
                position: 0,
                start: 0,
                end: text.len(),
            });
            return Box::new(token.into_iter());
        }

        Box::new(self.tokenizer.tokenize(text).filter_map(move |raw| {
            let mut token = if self.lowercase {
                raw.text.to_lowercase()
            } else {
                raw.text.to_string()
            };

            if self.remove_stopwords && german_stopwords().contains(&token) {
                return None;
            }

            if self.normalize {
                token = normalize_german(&token);
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token);
            }

            Some(Token {
                term: Term(token),
                position: raw.position,
                start: raw.start,
                end: raw.end,
            })
        }))
    }

    /// Normalize a prefix-query prefix
    ///
    /// Lowercases and applies German normalization when the analyzer does,
    /// but never stems or drops stop words: a partial word must stay partial.
    pub fn normalize_prefix(&self, prefix: &str) -> String {
        let mut out = if self.lowercase {
            prefix.to_lowercase()
        } else {
            prefix.to_string()
        };
        if self.normalize {
            out = normalize_german(&out);
        }
        out
    }

    /// Analyze text into a lazy sequence of terms
    pub fn analyze<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Term> + 'a {
        self.tokens(text).map(|token| token.term)
    }

    /// Compute term frequencies for a piece of text
    pub fn term_frequencies(&self, text: &str) -> HashMap<Term, u32> {
        let mut freq = HashMap::new();
        for term in self.analyze(text) {
            *freq.entry(term).or_insert(0) += 1;
        }
        freq
    }
}

/// Analyzer selection by field name
#[derive(Clone, Debug)]
pub struct FieldAnalyzers {
    default: Analyzer,
    overrides: HashMap<String, Analyzer>,
}

impl FieldAnalyzers {
    pub fn new(default: Analyzer) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Build the default analyzer and all per-field overrides from index settings
    pub fn from_settings(settings: &IndexSettings) -> Result<Self> {
        Self::from_config(&settings.analyzer, &settings.field_analyzers)
    }

    pub fn from_config(
        default: &AnalyzerConfig,
        overrides: &BTreeMap<String, AnalyzerKind>,
    ) -> Result<Self> {
        let mut analyzers = Self::new(Analyzer::new(default)?);
        for (field, kind) in overrides {
            let config = AnalyzerConfig {
                kind: *kind,
                ..default.clone()
            };
            analyzers = analyzers.with_field(field.clone(), Analyzer::new(&config)?);
        }
        Ok(analyzers)
    }

    pub fn with_field(mut self, field: impl Into<String>, analyzer: Analyzer) -> Self {
        self.overrides.insert(field.into(), analyzer);
        self
    }

    pub fn for_field(&self, field: &str) -> &Analyzer {
        self.overrides.get(field).unwrap_or(&self.default)
    }

    pub fn default_analyzer(&self) -> &Analyzer {
        &self.default
    }
}

impl From<Analyzer> for FieldAnalyzers {
    fn from(analyzer: Analyzer) -> Self {
        Self::new(analyzer)
    }
}
