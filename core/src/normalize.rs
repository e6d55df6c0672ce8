use crate::lemma::{DictionaryLemmatizer, Lemmatizer};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref UNSAFE: Regex = Regex::new(r"[^a-zA-Z0-9,']").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Replace every character outside `[a-zA-Z0-9,']` with a space.
pub fn escape(text: &str) -> String {
    UNSAFE.replace_all(text, " ").into_owned()
}

/// Which optional passes run after tokenization and case folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    #[default]
    Plain,
    Stemming,
    Lemmatizing,
    StemmingAndLemmatizing,
}

impl NormalizerKind {
    pub fn from_flags(stem: bool, lemmatize: bool) -> Self {
        match (stem, lemmatize) {
            (false, false) => Self::Plain,
            (true, false) => Self::Stemming,
            (false, true) => Self::Lemmatizing,
            (true, true) => Self::StemmingAndLemmatizing,
        }
    }

    pub fn stems(self) -> bool {
        matches!(self, Self::Stemming | Self::StemmingAndLemmatizing)
    }

    pub fn lemmatizes(self) -> bool {
        matches!(self, Self::Lemmatizing | Self::StemmingAndLemmatizing)
    }
}

impl fmt::Display for NormalizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plain => "plain",
            Self::Stemming => "stemming",
            Self::Lemmatizing => "lemmatizing",
            Self::StemmingAndLemmatizing => "stemming+lemmatizing",
        };
        f.write_str(s)
    }
}

/// Turns raw text into index terms.
///
/// Pipeline: NFKC, escape to `[a-zA-Z0-9,']`, split on whitespace, trim
/// leading/trailing `,` and `'`, lowercase, then stem when the kind asks for
/// it. Lemmatization runs on the whole text segment: before escaping for
/// document bodies ([`Normalizer::normalize`]) and after escaping for
/// queries ([`Normalizer::normalize_query`]). No stopwords are removed.
#[derive(Clone)]
pub struct Normalizer {
    kind: NormalizerKind,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerKind::Plain)
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl Normalizer {
    /// A normalizer backed by the built-in [`DictionaryLemmatizer`].
    pub fn new(kind: NormalizerKind) -> Self {
        Self::with_lemmatizer(kind, Arc::new(DictionaryLemmatizer::default()))
    }

    pub fn with_lemmatizer(kind: NormalizerKind, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { kind, lemmatizer }
    }

    pub fn kind(&self) -> NormalizerKind {
        self.kind
    }

    /// Lemmatize a text segment, or return it unchanged when this kind does
    /// not lemmatize.
    pub fn lemmatize(&self, text: &str) -> String {
        if self.kind.lemmatizes() {
            self.lemmatizer.lemmatize(text)
        } else {
            text.to_string()
        }
    }

    /// Normalize document text: lemmatize the raw segment, then tokenize.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded = text.nfkc().collect::<String>();
        self.terms(&self.lemmatize(&folded))
    }

    /// Normalize query text: escape first, then lemmatize, then tokenize.
    pub fn normalize_query(&self, text: &str) -> Vec<String> {
        let folded = text.nfkc().collect::<String>();
        self.terms(&self.lemmatize(&escape(&folded)))
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let escaped = escape(text);
        let stem = self.kind.stems();
        escaped
            .split_whitespace()
            .map(|t| t.trim_matches([',', '\'']))
            .filter(|t| !t.is_empty())
            .map(|t| {
                let lower = t.to_lowercase();
                if stem {
                    STEMMER.stem(&lower).into_owned()
                } else {
                    lower
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_to_safe_alphabet() {
        assert_eq!(escape("Who's #1? (1,000 m)"), "Who's  1   1,000 m ");
    }

    #[test]
    fn plain_lowercases_and_keeps_inner_apostrophes() {
        let n = Normalizer::new(NormalizerKind::Plain);
        assert_eq!(n.normalize("Don't PANIC, 'Arthur' 1,000!"), vec!["don't", "panic", "arthur", "1,000"]);
    }

    #[test]
    fn stemming_reduces_inflections() {
        let n = Normalizer::new(NormalizerKind::Stemming);
        assert_eq!(n.normalize("Running runs"), vec!["run", "run"]);
    }

    #[test]
    fn empty_input_is_empty() {
        for kind in [
            NormalizerKind::Plain,
            NormalizerKind::Stemming,
            NormalizerKind::Lemmatizing,
            NormalizerKind::StemmingAndLemmatizing,
        ] {
            assert!(Normalizer::new(kind).normalize("").is_empty());
            assert!(Normalizer::new(kind).normalize_query("  ?! ").is_empty());
        }
    }

    #[test]
    fn lemmatizing_maps_base_forms() {
        let n = Normalizer::new(NormalizerKind::Lemmatizing);
        assert_eq!(n.normalize("Children were running home"), vec!["child", "be", "run", "home"]);
        assert_eq!(n.normalize("Athens hosts games"), vec!["athens", "host", "game"]);
        let both = Normalizer::new(NormalizerKind::StemmingAndLemmatizing);
        assert_eq!(both.normalize("Children were running home"), vec!["child", "be", "run", "home"]);
    }

    #[test]
    fn full_width_digits_fold() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("１９２１"), vec!["1921"]);
    }

    #[test]
    fn kind_from_flags() {
        assert_eq!(NormalizerKind::from_flags(true, true), NormalizerKind::StemmingAndLemmatizing);
        assert!(NormalizerKind::from_flags(false, true).lemmatizes());
        assert!(!NormalizerKind::from_flags(false, true).stems());
    }
}
