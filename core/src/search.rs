use crate::error::{Error, Result};
use crate::index::{DocId, Document, InvertedIndex};
use crate::normalize::Normalizer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Sum of raw term frequencies of the distinct query terms a document
    /// contains.
    #[default]
    Boolean,
    /// Classic `tf * ln(N / df)` summed over query terms.
    TfIdf,
}

impl FromStr for RankingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(Self::Boolean),
            "tfidf" | "tf-idf" => Ok(Self::TfIdf),
            other => Err(Error::InvalidConfig(format!("unknown ranking mode {other:?}"))),
        }
    }
}

impl fmt::Display for RankingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boolean => "boolean",
            Self::TfIdf => "tfidf",
        })
    }
}

/// A parsed query: the raw text and the terms it normalizes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw_text: String,
    pub terms: Vec<String>,
}

impl Query {
    /// Normalize `raw` the way queries are normalized. A query with no
    /// searchable term is a [`Error::QuerySyntax`].
    pub fn parse(raw: &str, normalizer: &Normalizer) -> Result<Self> {
        let terms = normalizer.normalize_query(raw);
        if terms.is_empty() {
            return Err(Error::QuerySyntax(raw.to_string()));
        }
        Ok(Self { raw_text: raw.to_string(), terms })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub document: &'a Document,
    pub score: f32,
}

impl SearchHit<'_> {
    pub fn title(&self) -> &str {
        &self.document.title
    }
}

/// Ranks indexed documents against free-text queries.
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    normalizer: Normalizer,
}

impl<'a> Searcher<'a> {
    /// A searcher that normalizes queries with the index's own normalizer
    /// kind and the built-in lemmatizer.
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self { index, normalizer: Normalizer::new(index.normalizer_kind()) }
    }

    /// Use a custom normalizer, e.g. one with a different lemmatizer. Its
    /// kind must match the kind the index was built with.
    pub fn with_normalizer(index: &'a InvertedIndex, normalizer: Normalizer) -> Result<Self> {
        if normalizer.kind() != index.normalizer_kind() {
            return Err(Error::InvalidConfig(format!(
                "query normalizer is {} but the index was built with {}",
                normalizer.kind(),
                index.normalizer_kind()
            )));
        }
        Ok(Self { index, normalizer })
    }

    pub fn index(&self) -> &'a InvertedIndex {
        self.index
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Best-first hits for `query`, at most `top_k` of them. Ties are broken
    /// by ascending document id. A query without searchable terms yields no
    /// hits.
    pub fn search(&self, query: &str, mode: RankingMode, top_k: usize) -> Vec<SearchHit<'a>> {
        match Query::parse(query, &self.normalizer) {
            Ok(q) => self.execute(&q, mode, top_k),
            Err(err) => {
                tracing::debug!(error = %err, "empty result for unsearchable query");
                Vec::new()
            }
        }
    }

    pub fn execute(&self, query: &Query, mode: RankingMode, top_k: usize) -> Vec<SearchHit<'a>> {
        if top_k == 0 {
            return Vec::new();
        }
        let scores = match mode {
            RankingMode::Boolean => self.boolean_scores(query),
            RankingMode::TfIdf => self.tfidf_scores(query),
        };
        let mut scored: Vec<(DocId, f32)> = scores.into_iter().collect();
        let by_rank = |a: &(DocId, f32), b: &(DocId, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };
        if top_k < scored.len() {
            scored.select_nth_unstable_by(top_k - 1, by_rank);
            scored.truncate(top_k);
        }
        scored.sort_unstable_by(by_rank);

        scored
            .into_iter()
            .filter_map(|(doc_id, score)| {
                self.index.document(doc_id).map(|document| SearchHit { document, score })
            })
            .collect()
    }

    fn boolean_scores(&self, query: &Query) -> HashMap<DocId, f32> {
        let mut scores: HashMap<DocId, f32> = HashMap::new();
        let distinct: HashSet<&str> = query.terms.iter().map(String::as_str).collect();
        for term in distinct {
            for p in self.index.postings(term) {
                *scores.entry(p.doc_id).or_insert(0.0) += p.term_frequency as f32;
            }
        }
        scores
    }

    fn tfidf_scores(&self, query: &Query) -> HashMap<DocId, f32> {
        let mut scores: HashMap<DocId, f32> = HashMap::new();
        let n = self.index.num_docs() as f32;
        for term in &query.terms {
            let postings = self.index.postings(term);
            if postings.is_empty() {
                continue;
            }
            let idf = (n / postings.len() as f32).ln();
            for p in postings {
                *scores.entry(p.doc_id).or_insert(0.0) += p.term_frequency as f32 * idf;
            }
        }
        scores
    }
}
