use wikiqa_core::corpus::parse;
use wikiqa_core::{
    Evaluator, IndexBuilder, InvertedIndex, LineLimit, MemorySource, Normalizer, NormalizerKind, RankingMode,
    Searcher, DEFAULT_TOP_K,
};

fn build(corpus: &str, kind: NormalizerKind) -> InvertedIndex {
    let mut builder = IndexBuilder::new(Normalizer::new(kind), LineLimit::Unlimited);
    builder.add_source(&MemorySource::new().with_text("enwiki-test", corpus)).unwrap();
    builder.finish()
}

const PARIS_FRANCE: &str = "[[Paris]]\ncapital of France\n[[France]]\ncountry in Europe capital Paris\n";

#[test]
fn single_document_boolean_query() {
    let index = build("[[Albert Einstein]]\ntheory of relativity physicist\n", NormalizerKind::Plain);
    let searcher = Searcher::new(&index);
    let hits = searcher.search("relativity physicist", RankingMode::Boolean, DEFAULT_TOP_K);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title(), "Albert Einstein");
}

#[test]
fn tfidf_ordering_follows_formula() {
    let index = build(PARIS_FRANCE, NormalizerKind::Plain);
    let searcher = Searcher::new(&index);
    let hits = searcher.search("capital", RankingMode::TfIdf, DEFAULT_TOP_K);
    let titles: Vec<&str> = hits.iter().map(|h| h.title()).collect();
    // ln(2 / 2) = 0 for both, so ascending id decides
    assert_eq!(titles, vec!["Paris", "France"]);

    let hits = searcher.search("capital europe", RankingMode::TfIdf, DEFAULT_TOP_K);
    assert_eq!(hits[0].title(), "France");
    assert!((hits[0].score - 2f32.ln()).abs() < 1e-6);
    assert_eq!(hits[1].score, 0.0);
}

#[test]
fn evaluation_scores_paris() {
    let index = build(PARIS_FRANCE, NormalizerKind::Plain);
    let searcher = Searcher::new(&index);
    let questions = "Cities\ncapital of France\nParis\n\n";
    let report = Evaluator::new(&searcher, RankingMode::Boolean, DEFAULT_TOP_K, true)
        .run(questions.as_bytes())
        .unwrap();
    assert_eq!(report.correct_count, 1);
    assert_eq!(report.mrr, Some(1.0));
}

#[test]
fn evaluation_rank_two_adds_half() {
    let index = build(PARIS_FRANCE, NormalizerKind::Plain);
    let searcher = Searcher::new(&index);
    let questions = "Cities\ncapital of France\nFrance\n\n";
    let report = Evaluator::new(&searcher, RankingMode::Boolean, DEFAULT_TOP_K, true)
        .run(questions.as_bytes())
        .unwrap();
    assert_eq!(report.correct_count, 0);
    assert_eq!(report.outcomes[0].produced, "Paris");
    assert_eq!(report.mrr, Some(0.5));
}

#[test]
fn title_at_eof_indexes_cleanly() {
    let index = build("[[X]]", NormalizerKind::Stemming);
    assert_eq!(index.num_docs(), 1);
    assert_eq!(index.document(0).unwrap().title, "X");
    assert!(index.document(0).unwrap().terms.is_empty());
    index.verify();
}

#[test]
fn empty_corpus_answers_nothing() {
    let index = InvertedIndex::build(parse(Vec::<String>::new(), &Normalizer::default(), LineLimit::Unlimited), NormalizerKind::Plain);
    assert!(index.is_empty());
    let searcher = Searcher::new(&index);
    for mode in [RankingMode::Boolean, RankingMode::TfIdf] {
        assert!(searcher.search("capital of France", mode, DEFAULT_TOP_K).is_empty());
    }
}

#[test]
fn search_is_deterministic() {
    let index = build(PARIS_FRANCE, NormalizerKind::Stemming);
    let searcher = Searcher::new(&index);
    for mode in [RankingMode::Boolean, RankingMode::TfIdf] {
        let a: Vec<(String, f32)> =
            searcher.search("capital Paris", mode, 10).iter().map(|h| (h.title().to_string(), h.score)).collect();
        let b: Vec<(String, f32)> =
            searcher.search("capital Paris", mode, 10).iter().map(|h| (h.title().to_string(), h.score)).collect();
        assert_eq!(a, b);
    }
}

#[test]
fn rarer_term_ranks_at_least_as_high() {
    let corpus = "[[A]]\nriver town\n[[B]]\nriver bridge\n[[C]]\nriver town\n[[D]]\ntown hall\n";
    let index = build(corpus, NormalizerKind::Plain);
    let searcher = Searcher::new(&index);
    // "bridge" (df 1) is rarer than "town" (df 3)
    let hits = searcher.search("river bridge town", RankingMode::TfIdf, 10);
    let pos = |t: &str| hits.iter().position(|h| h.title() == t).unwrap();
    assert!(pos("B") < pos("A"));
    assert!(pos("B") < pos("C"));
}

#[test]
fn lemmatized_index_matches_inflected_clue() {
    let corpus = "[[Ulm]]\na story of a city\n[[Moby-Dick]]\nIshmael told a story\n";
    let questions = "Books\nWho tell this story\nMoby-Dick\n\n";

    let plain = build(corpus, NormalizerKind::Plain);
    let searcher = Searcher::new(&plain);
    let report = Evaluator::new(&searcher, RankingMode::Boolean, DEFAULT_TOP_K, false)
        .run(questions.as_bytes())
        .unwrap();
    assert_eq!(report.outcomes[0].produced, "Ulm");

    let lemmatized = build(corpus, NormalizerKind::Lemmatizing);
    let searcher = Searcher::new(&lemmatized);
    let report = Evaluator::new(&searcher, RankingMode::Boolean, DEFAULT_TOP_K, false)
        .run(questions.as_bytes())
        .unwrap();
    assert_eq!(report.correct_count, 1);
}
