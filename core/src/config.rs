use crate::corpus::LineLimit;
use crate::error::{Error, Result};
use crate::normalize::NormalizerKind;
use crate::search::{RankingMode, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options recognized by a question-answering run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the corpus files and the question file.
    pub corpus_dir: PathBuf,
    /// Only corpus files whose name contains this substring are indexed.
    pub corpus_filter: String,
    /// Substring identifying the question file inside `corpus_dir`.
    pub questions: String,
    pub index_dir: PathBuf,
    pub rebuild_index: bool,
    pub use_stemming: bool,
    pub use_lemmatization: bool,
    /// Extra `form<TAB>lemma` entries for the lemmatizer.
    pub lemma_file: Option<PathBuf>,
    pub max_lines_per_document: LineLimit,
    pub ranking_mode: RankingMode,
    pub top_k: usize,
    pub compute_mrr: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("resources"),
            corpus_filter: "enwiki".into(),
            questions: "questions.txt".into(),
            index_dir: PathBuf::from("index"),
            rebuild_index: false,
            use_stemming: true,
            use_lemmatization: false,
            lemma_file: None,
            max_lines_per_document: LineLimit::Unlimited,
            ranking_mode: RankingMode::Boolean,
            top_k: DEFAULT_TOP_K,
            compute_mrr: false,
        }
    }
}

impl Config {
    pub fn normalizer_kind(&self) -> NormalizerKind {
        NormalizerKind::from_flags(self.use_stemming, self.use_lemmatization)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.corpus_filter.is_empty() {
            return Err(Error::InvalidConfig("corpus filter must not be empty".into()));
        }
        if self.questions.is_empty() {
            return Err(Error::InvalidConfig("question file name must not be empty".into()));
        }
        if self.lemma_file.is_some() && !self.use_lemmatization {
            tracing::warn!("lemma file given but lemmatization is disabled; ignoring it");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.normalizer_kind(), NormalizerKind::Stemming);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let config = Config { top_k: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn json_uses_minus_one_for_unlimited() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["max_lines_per_document"], -1);
        assert_eq!(json["ranking_mode"], "boolean");

        let parsed: Config =
            serde_json::from_str(r#"{"max_lines_per_document": 40, "ranking_mode": "tfidf"}"#).unwrap();
        assert_eq!(parsed.max_lines_per_document, LineLimit::Max(40));
        assert_eq!(parsed.ranking_mode, RankingMode::TfIdf);
        assert_eq!(parsed.corpus_filter, "enwiki");

        assert!(serde_json::from_str::<Config>(r#"{"max_lines_per_document": -3}"#).is_err());
    }
}
