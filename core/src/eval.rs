//! Question-answering evaluation.
//!
//! A question file is a sequence of four-line records:
//!
//! ```text
//! CATEGORY
//! clue text
//! Answer One|Answer Two
//! <blank>
//! ```
//!
//! Each clue is turned into a query, the top-ranked title is the produced
//! answer, and an exact match against any accepted answer counts as correct.

use crate::error::Result;
use crate::normalize::escape;
use crate::search::{RankingMode, SearchHit, Searcher};
use serde::Serialize;
use std::collections::HashSet;
use std::io::BufRead;

/// Answer reported when a query retrieves nothing.
pub const NO_ANSWER: &str = "NULL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub category: String,
    pub clue: String,
    pub accepted_answers: HashSet<String>,
}

/// Running counters for one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationState {
    pub correct_count: usize,
    pub reciprocal_rank_sum: f64,
    pub total_questions: usize,
}

impl EvaluationState {
    pub fn record(&mut self, outcome: &QuestionOutcome) {
        self.total_questions += 1;
        if outcome.correct {
            self.correct_count += 1;
        }
        if let Some(rr) = outcome.reciprocal_rank() {
            self.reciprocal_rank_sum += rr;
        }
    }

    /// Combine counters from independently evaluated question batches.
    pub fn merge(self, other: Self) -> Self {
        Self {
            correct_count: self.correct_count + other.correct_count,
            reciprocal_rank_sum: self.reciprocal_rank_sum + other.reciprocal_rank_sum,
            total_questions: self.total_questions + other.total_questions,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.total_questions as f64
    }

    pub fn mean_reciprocal_rank(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.reciprocal_rank_sum / self.total_questions as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    pub category: String,
    pub expected: String,
    pub produced: String,
    pub correct: bool,
    /// 1-based rank of the first accepted title, when ranks were computed
    /// and one was found.
    pub rank: Option<usize>,
}

impl QuestionOutcome {
    pub fn reciprocal_rank(&self) -> Option<f64> {
        self.rank.map(|r| 1.0 / r as f64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub ranking: RankingMode,
    pub mrr_enabled: bool,
    pub correct_count: usize,
    pub total_questions: usize,
    pub accuracy: f64,
    pub mrr: Option<f64>,
    pub outcomes: Vec<QuestionOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ReadCategory,
    ReadClue,
    ReadAnswerAndSearch,
    ReadBlankLine,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Self::ReadCategory => Self::ReadClue,
            Self::ReadClue => Self::ReadAnswerAndSearch,
            Self::ReadAnswerAndSearch => Self::ReadBlankLine,
            Self::ReadBlankLine => Self::ReadCategory,
        }
    }
}

/// 1-based position of the first hit whose title is accepted.
pub fn first_accepted_rank(hits: &[SearchHit<'_>], accepted: &HashSet<String>) -> Option<usize> {
    hits.iter().position(|h| accepted.contains(h.title())).map(|i| i + 1)
}

pub fn split_answers(line: &str) -> HashSet<String> {
    line.split('|').map(str::to_string).collect()
}

fn commit(state: &mut EvaluationState, outcomes: &mut Vec<QuestionOutcome>, outcome: QuestionOutcome) {
    tracing::info!(
        expected = %outcome.expected,
        answer = %outcome.produced,
        rank = ?outcome.rank,
        correct = outcome.correct,
        "question evaluated"
    );
    state.record(&outcome);
    outcomes.push(outcome);
}

/// Drives a [`Searcher`] over a question file.
pub struct Evaluator<'s, 'a> {
    searcher: &'s Searcher<'a>,
    ranking: RankingMode,
    top_k: usize,
    compute_mrr: bool,
}

impl<'s, 'a> Evaluator<'s, 'a> {
    pub fn new(searcher: &'s Searcher<'a>, ranking: RankingMode, top_k: usize, compute_mrr: bool) -> Self {
        Self { searcher, ranking, top_k, compute_mrr }
    }

    /// Lookup string for a record: the escaped category followed by the
    /// escaped (and, when enabled, lemmatized) clue.
    pub fn lookup(&self, category: &str, clue: &str) -> String {
        let clue = self.searcher.normalizer().lemmatize(&escape(clue));
        format!("{} {}", escape(category), clue)
    }

    /// Answer one question.
    pub fn answer(&self, question: &Question) -> QuestionOutcome {
        let lookup = self.lookup(&question.category, &question.clue);
        let mut expected: Vec<&str> = question.accepted_answers.iter().map(String::as_str).collect();
        expected.sort_unstable();
        self.answer_lookup(&question.category, &lookup, &question.accepted_answers, expected.join("|"))
    }

    fn answer_lookup(
        &self,
        category: &str,
        lookup: &str,
        accepted: &HashSet<String>,
        expected: String,
    ) -> QuestionOutcome {
        // every scored candidate is needed to find the rank of the answer
        let depth = if self.compute_mrr { usize::MAX } else { self.top_k };
        let hits = self.searcher.search(lookup, self.ranking, depth);
        let produced = hits.first().map_or(NO_ANSWER, |h| h.title()).to_string();
        let rank = if self.compute_mrr { first_accepted_rank(&hits, accepted) } else { None };
        QuestionOutcome {
            category: category.to_string(),
            correct: accepted.contains(&produced),
            expected,
            produced,
            rank,
        }
    }

    /// Evaluate every record of `reader`. A record counts once its answer
    /// line has been read, so the last record needs no blank line after it;
    /// a record cut off before its answer line is ignored.
    pub fn run<R: BufRead>(&self, reader: R) -> Result<EvaluationReport> {
        let mut state = EvaluationState::default();
        let mut outcomes = Vec::new();

        let mut phase = Phase::ReadCategory;
        let mut category = String::new();
        let mut clue = String::new();
        let mut pending: Option<QuestionOutcome> = None;

        for line in reader.lines() {
            let line = line?;
            match phase {
                Phase::ReadCategory => category = line,
                Phase::ReadClue => clue = line,
                Phase::ReadAnswerAndSearch => {
                    let accepted = split_answers(&line);
                    let lookup = self.lookup(&category, &clue);
                    pending = Some(self.answer_lookup(&category, &lookup, &accepted, line));
                }
                Phase::ReadBlankLine => {
                    if let Some(outcome) = pending.take() {
                        commit(&mut state, &mut outcomes, outcome);
                    }
                }
            }
            phase = phase.next();
        }
        if let Some(outcome) = pending.take() {
            commit(&mut state, &mut outcomes, outcome);
        }

        tracing::info!(
            correct = state.correct_count,
            total = state.total_questions,
            mrr = ?self.compute_mrr.then(|| state.mean_reciprocal_rank()),
            "evaluation finished"
        );
        Ok(EvaluationReport {
            ranking: self.ranking,
            mrr_enabled: self.compute_mrr,
            correct_count: state.correct_count,
            total_questions: state.total_questions,
            accuracy: state.accuracy(),
            mrr: self.compute_mrr.then(|| state.mean_reciprocal_rank()),
            outcomes,
        })
    }
}
