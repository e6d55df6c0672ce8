use wikiqa_core::normalize::{Normalizer, NormalizerKind};

#[test]
fn it_lowercases_and_stems() {
    let n = Normalizer::new(NormalizerKind::Stemming);
    let words = n.normalize("Running Runners RUN! The physicist's theories.");
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"theori".to_string()));
    assert!(words.iter().all(|w| w.chars().all(|c| !c.is_uppercase())));
}

#[test]
fn it_keeps_stopwords() {
    let n = Normalizer::default();
    let words = n.normalize("The quick brown fox and the lazy dog");
    assert_eq!(words.iter().filter(|w| *w == "the").count(), 2);
    assert!(words.contains(&"and".to_string()));
}

#[test]
fn it_is_deterministic() {
    let text = "==Early life== Einstein was born in Ulm, in 1879; he went to school in Munich.";
    for kind in [
        NormalizerKind::Plain,
        NormalizerKind::Stemming,
        NormalizerKind::Lemmatizing,
        NormalizerKind::StemmingAndLemmatizing,
    ] {
        let n = Normalizer::new(kind);
        assert_eq!(n.normalize(text), n.normalize(text));
        assert_eq!(n.normalize_query(text), n.normalize_query(text));
    }
}

#[test]
fn query_and_document_pipelines_agree_on_plain_text() {
    let n = Normalizer::new(NormalizerKind::StemmingAndLemmatizing);
    let text = "The children went to the cities";
    assert_eq!(n.normalize(text), n.normalize_query(text));
}

#[test]
fn non_ascii_letters_split_tokens() {
    let n = Normalizer::default();
    assert_eq!(n.normalize("Zürich"), vec!["z", "rich"]);
}
