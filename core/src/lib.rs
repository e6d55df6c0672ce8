//! Trivia question answering over a line-based Wikipedia dump.
//!
//! [`corpus`] splits the dump into titled documents, [`index`] builds an
//! inverted index over their normalized terms, [`search`] ranks documents
//! for a free-text query and [`eval`] scores a question file by top-1
//! accuracy and mean reciprocal rank.

pub mod config;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod index;
pub mod lemma;
pub mod normalize;
pub mod persist;
pub mod search;

pub use config::Config;
pub use corpus::{CorpusParser, CorpusSource, DocumentDraft, LineLimit, MemorySource};
pub use error::{Error, Result};
pub use eval::{EvaluationReport, EvaluationState, Evaluator, Question, QuestionOutcome, NO_ANSWER};
pub use index::{BuildStats, DocId, Document, IndexBuilder, InvertedIndex, Posting};
pub use lemma::{DictionaryLemmatizer, Lemmatizer};
pub use normalize::{escape, Normalizer, NormalizerKind};
pub use search::{Query, RankingMode, SearchHit, Searcher, DEFAULT_TOP_K};
