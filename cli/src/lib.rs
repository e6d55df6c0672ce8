use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;
use wikiqa_core::persist::{load_index, save_index, IndexPaths};
use wikiqa_core::{
    Config, CorpusSource, DictionaryLemmatizer, Error, EvaluationReport, Evaluator, IndexBuilder, InvertedIndex,
    Normalizer, Result, Searcher,
};

/// Corpus files in one directory (not recursive) whose file name contains
/// `filter`, in name order.
pub struct DirectorySource {
    dir: PathBuf,
    filter: String,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P, filter: impl Into<String>) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), filter: filter.into() }
    }

    fn not_found(&self) -> Error {
        Error::CorpusNotFound { location: self.location(), filter: Some(self.filter.clone()) }
    }
}

/// Names of the files directly inside `dir` whose name contains `needle`.
fn matching_files(dir: &Path, needle: &str) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| name.contains(needle))
        .collect();
    names.sort();
    names
}

impl CorpusSource for DirectorySource {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn filter(&self) -> Option<&str> {
        Some(&self.filter)
    }

    fn names(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(self.not_found());
        }
        let names = matching_files(&self.dir, &self.filter);
        if names.is_empty() {
            return Err(self.not_found());
        }
        Ok(names)
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let f = File::open(self.dir.join(name))?;
        Ok(Box::new(BufReader::new(f)))
    }
}

/// First file in `dir` (by name) whose name contains `name`.
pub fn find_question_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let not_found = || Error::QuestionFileNotFound { location: dir.display().to_string(), name: name.to_string() };
    if !dir.is_dir() {
        return Err(not_found());
    }
    matching_files(dir, name).into_iter().next().map(|f| dir.join(f)).ok_or_else(not_found)
}

pub fn normalizer_for(config: &Config) -> Result<Normalizer> {
    let kind = config.normalizer_kind();
    match (&config.lemma_file, kind.lemmatizes()) {
        (Some(path), true) => {
            let lemmatizer = DictionaryLemmatizer::with_table_file(path)?;
            tracing::info!(path = %path.display(), entries = lemmatizer.len(), "loaded lemma table");
            Ok(Normalizer::with_lemmatizer(kind, Arc::new(lemmatizer)))
        }
        _ => Ok(Normalizer::new(kind)),
    }
}

/// Parse and index every matching corpus file, then save the index.
pub fn build_index(config: &Config) -> Result<InvertedIndex> {
    let source = DirectorySource::new(&config.corpus_dir, config.corpus_filter.clone());
    let mut builder = IndexBuilder::new(normalizer_for(config)?, config.max_lines_per_document);
    let stats = builder.add_source(&source)?;
    tracing::info!(
        indexed = stats.sources_indexed,
        skipped = stats.sources_skipped,
        documents = stats.documents,
        "corpus ingested"
    );
    let index = builder.finish();
    save_index(&IndexPaths::new(&config.index_dir), &index, config)?;
    Ok(index)
}

/// Reuse the saved index unless a rebuild is requested or none exists yet.
pub fn open_index(config: &Config) -> Result<InvertedIndex> {
    let paths = IndexPaths::new(&config.index_dir);
    if config.rebuild_index || !paths.exists() {
        return build_index(config);
    }
    let (index, meta) = load_index(&paths)?;
    if meta.normalizer != config.normalizer_kind() {
        tracing::warn!(
            built_with = %meta.normalizer,
            requested = %config.normalizer_kind(),
            "saved index uses a different normalizer; queries follow the index"
        );
    }
    Ok(index)
}

/// Searcher for `index`, sharing the configured lemma table when the index
/// lemmatizes.
pub fn searcher_for<'a>(index: &'a InvertedIndex, config: &Config) -> Result<Searcher<'a>> {
    let normalizer = normalizer_for(config)?;
    if normalizer.kind() == index.normalizer_kind() {
        Searcher::with_normalizer(index, normalizer)
    } else {
        Ok(Searcher::new(index))
    }
}

/// Answer every question of the configured question file.
pub fn evaluate(config: &Config) -> Result<EvaluationReport> {
    config.validate()?;
    let questions = find_question_file(&config.corpus_dir, &config.questions)?;
    let index = open_index(config)?;
    let searcher = searcher_for(&index, config)?;
    tracing::info!(questions = %questions.display(), ranking = %config.ranking_mode, mrr = config.compute_mrr, "evaluating");
    let reader = BufReader::new(File::open(&questions)?);
    Evaluator::new(&searcher, config.ranking_mode, config.top_k, config.compute_mrr).run(reader)
}

/// Run one query and return `(title, score)` pairs, best first.
pub fn search(config: &Config, query: &str) -> Result<Vec<(String, f32)>> {
    config.validate()?;
    let index = open_index(config)?;
    let searcher = searcher_for(&index, config)?;
    let hits = searcher.search(query, config.ranking_mode, config.top_k);
    Ok(hits.into_iter().map(|h| (h.title().to_string(), h.score)).collect())
}
