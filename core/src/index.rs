use crate::corpus::{parse_reader, CorpusSource, DocumentDraft, LineLimit};
use crate::error::{Error, Result};
use crate::normalize::{Normalizer, NormalizerKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Verbatim title; answers are matched against it exactly.
    pub title: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

/// Term → postings (ascending doc id), plus the documents themselves.
///
/// Read-only once built. Documents are stored so that `docs[id].id == id`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) postings: HashMap<String, Vec<Posting>>,
    pub(crate) docs: Vec<Document>,
    pub(crate) normalizer: NormalizerKind,
}

impl InvertedIndex {
    pub fn new(normalizer: NormalizerKind) -> Self {
        Self { normalizer, ..Self::default() }
    }

    /// Build an index from already-parsed drafts, in order.
    pub fn build<I>(drafts: I, normalizer: NormalizerKind) -> Self
    where
        I: IntoIterator<Item = DocumentDraft>,
    {
        let mut index = Self::new(normalizer);
        for draft in drafts {
            index.insert(draft);
        }
        #[cfg(debug_assertions)]
        index.verify();
        index
    }

    fn insert(&mut self, draft: DocumentDraft) -> DocId {
        let doc_id = self.docs.len() as DocId;
        let mut tf_counts: HashMap<&str, u32> = HashMap::new();
        // first-occurrence order keeps posting insertion deterministic
        let mut order: Vec<&str> = Vec::new();
        for term in &draft.terms {
            let count = tf_counts.entry(term.as_str()).or_insert(0);
            if *count == 0 {
                order.push(term.as_str());
            }
            *count += 1;
        }
        for term in order {
            let term_frequency = tf_counts[term];
            self.postings
                .entry(term.to_string())
                .or_default()
                .push(Posting { doc_id, term_frequency });
        }
        self.docs.push(Document { id: doc_id, title: draft.title, terms: draft.terms });
        doc_id
    }

    pub fn normalizer_kind(&self) -> NormalizerKind {
        self.normalizer
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings(term).len()
    }

    /// Every document with this exact title, in id order. Duplicate titles
    /// are kept as separate documents.
    pub fn documents_titled<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a Document> + 'a {
        self.docs.iter().filter(move |d| d.title == title)
    }

    /// Panics if postings disagree with the stored documents.
    pub fn verify(&self) {
        let mut expected: HashMap<(&str, DocId), u32> = HashMap::new();
        for (i, doc) in self.docs.iter().enumerate() {
            assert_eq!(doc.id as usize, i, "document id out of place");
            for term in &doc.terms {
                *expected.entry((term.as_str(), doc.id)).or_insert(0) += 1;
            }
        }
        for (term, plist) in &self.postings {
            assert!(!plist.is_empty(), "term {term:?} has no postings");
            for pair in plist.windows(2) {
                assert!(pair[0].doc_id < pair[1].doc_id, "postings for {term:?} out of order");
            }
            for p in plist {
                let actual = expected.remove(&(term.as_str(), p.doc_id));
                assert_eq!(Some(p.term_frequency), actual, "tf mismatch for {term:?} in doc {}", p.doc_id);
            }
        }
        assert!(expected.is_empty(), "{} (term, doc) pairs have no posting", expected.len());
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub sources_indexed: usize,
    pub sources_skipped: usize,
    pub documents: usize,
}

/// Feeds corpus sources through the parser into an [`InvertedIndex`].
pub struct IndexBuilder {
    normalizer: Normalizer,
    max_lines: LineLimit,
    index: InvertedIndex,
    stats: BuildStats,
}

impl IndexBuilder {
    pub fn new(normalizer: Normalizer, max_lines: LineLimit) -> Self {
        let index = InvertedIndex::new(normalizer.kind());
        Self { normalizer, max_lines, index, stats: BuildStats::default() }
    }

    pub fn add_draft(&mut self, draft: DocumentDraft) -> DocId {
        self.stats.documents += 1;
        self.index.insert(draft)
    }

    /// Index every text of `source`. A text that cannot be read or holds no
    /// title marker is logged and skipped; only an empty source fails.
    pub fn add_source(&mut self, source: &dyn CorpusSource) -> Result<BuildStats> {
        let names = source.names()?;
        if names.is_empty() {
            return Err(Error::CorpusNotFound {
                location: source.location(),
                filter: source.filter().map(str::to_string),
            });
        }
        for name in names {
            tracing::info!(source = %name, "indexing");
            let parsed = source
                .open(&name)
                .map_err(Error::from)
                .and_then(|reader| parse_reader(&name, reader, &self.normalizer, self.max_lines));
            match parsed {
                Ok(drafts) => {
                    let count = drafts.len();
                    for draft in drafts {
                        self.add_draft(draft);
                    }
                    self.stats.sources_indexed += 1;
                    tracing::debug!(source = %name, documents = count, "indexed source");
                }
                Err(err) => {
                    self.stats.sources_skipped += 1;
                    tracing::warn!(source = %name, error = %err, "skipping source");
                }
            }
        }
        Ok(self.stats)
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn finish(self) -> InvertedIndex {
        #[cfg(debug_assertions)]
        self.index.verify();
        tracing::info!(
            documents = self.index.num_docs(),
            terms = self.index.num_terms(),
            normalizer = %self.index.normalizer,
            "index built"
        );
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemorySource;

    fn draft(title: &str, body: &str) -> DocumentDraft {
        DocumentDraft { title: title.into(), terms: Normalizer::default().normalize(body) }
    }

    #[test]
    fn term_frequencies_and_document_frequency() {
        let index = InvertedIndex::build(
            [draft("A", "rust rust systems"), draft("B", "rust web")],
            NormalizerKind::Plain,
        );
        assert_eq!(index.num_docs(), 2);
        assert_eq!(index.postings("rust"), &[
            Posting { doc_id: 0, term_frequency: 2 },
            Posting { doc_id: 1, term_frequency: 1 },
        ]);
        assert_eq!(index.doc_frequency("web"), 1);
        assert_eq!(index.doc_frequency("missing"), 0);
    }

    #[test]
    fn postings_sum_to_document_length() {
        let index = InvertedIndex::build(
            [draft("A", "a b a c a"), draft("B", ""), draft("C", "c c")],
            NormalizerKind::Plain,
        );
        for doc in index.documents() {
            let total: u32 = index
                .postings
                .values()
                .flatten()
                .filter(|p| p.doc_id == doc.id)
                .map(|p| p.term_frequency)
                .sum();
            assert_eq!(total as usize, doc.terms.len());
        }
        index.verify();
    }

    #[test]
    fn duplicate_titles_are_both_kept() {
        let index = InvertedIndex::build([draft("Same", "one"), draft("Same", "two")], NormalizerKind::Plain);
        let ids: Vec<DocId> = index.documents_titled("Same").map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn titles_are_not_normalized() {
        let index = InvertedIndex::build([draft("Albert Einstein", "physicist")], NormalizerKind::Stemming);
        assert_eq!(index.document(0).unwrap().title, "Albert Einstein");
        assert_eq!(index.doc_frequency("albert"), 0);
    }

    #[test]
    fn builder_skips_sources_without_titles() {
        let source = MemorySource::new()
            .with_text("enwiki-1", "[[A]]\nalpha\n[[B]]\nbeta")
            .with_text("enwiki-2", "no markers here")
            .with_text("enwiki-3", "[[X]]");
        let mut builder = IndexBuilder::new(Normalizer::default(), LineLimit::Unlimited);
        let stats = builder.add_source(&source).unwrap();
        assert_eq!(stats, BuildStats { sources_indexed: 2, sources_skipped: 1, documents: 3 });
        let index = builder.finish();
        let titles: Vec<&str> = index.documents().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "X"]);
        assert!(index.document(2).unwrap().terms.is_empty());
    }

    #[test]
    fn builder_indexes_sources_with_invalid_utf8() {
        let source = MemorySource::new().with_bytes(
            "enwiki-latin1",
            &b"[[Paris]]\ncapital of France\n[[Ulm]]\ncaf\xE9 on the Danube\n[[Berlin]]\ncapital of Germany\n"[..],
        );
        let mut builder = IndexBuilder::new(Normalizer::default(), LineLimit::Unlimited);
        let stats = builder.add_source(&source).unwrap();
        assert_eq!(stats, BuildStats { sources_indexed: 1, sources_skipped: 0, documents: 3 });
        let index = builder.finish();
        assert_eq!(index.doc_frequency("danube"), 1);
    }

    #[test]
    fn empty_source_is_corpus_not_found() {
        let mut builder = IndexBuilder::new(Normalizer::default(), LineLimit::Unlimited);
        let err = builder.add_source(&MemorySource::new()).unwrap_err();
        assert!(matches!(err, Error::CorpusNotFound { filter: None, .. }));
        assert_eq!(err.to_string(), "no corpus files found in memory");
    }
}
