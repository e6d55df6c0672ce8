//! Splits a line-based Wikipedia dump into titled documents.
//!
//! A line `[[Title]]` opens a new document, `==Heading==` lines contribute
//! their inner text to the body, every other line is body text.

use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, BufRead, Cursor};

/// Per-document cap on accumulated body lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum LineLimit {
    #[default]
    Unlimited,
    Max(usize),
}

impl LineLimit {
    fn admits(self, line_count: usize) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Max(max) => line_count < max,
        }
    }
}

impl TryFrom<i64> for LineLimit {
    type Error = Error;

    /// `-1` means unlimited; any other negative value is rejected.
    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Self::Unlimited),
            v if v >= 0 => Ok(Self::Max(v as usize)),
            v => Err(Error::InvalidConfig(format!("max lines must be -1 or >= 0, got {v}"))),
        }
    }
}

impl From<LineLimit> for i64 {
    fn from(limit: LineLimit) -> Self {
        match limit {
            LineLimit::Unlimited => -1,
            LineLimit::Max(n) => n as i64,
        }
    }
}

impl fmt::Display for LineLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Max(n) => write!(f, "{n}"),
        }
    }
}

/// A parsed document waiting for an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub title: String,
    pub terms: Vec<String>,
}

fn marker_inner<'a>(line: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if line.len() < 4 {
        return None;
    }
    line.strip_prefix(open)?.strip_suffix(close)
}

struct OpenDraft {
    title: String,
    body: String,
    line_count: usize,
}

/// Streaming corpus parser.
///
/// Feed lines with [`CorpusParser::push_line`]; a finished draft comes back
/// whenever a title marker closes the previous one. Call
/// [`CorpusParser::finish`] at end of input to flush the last draft.
pub struct CorpusParser<'n> {
    normalizer: &'n Normalizer,
    max_lines: LineLimit,
    open: Option<OpenDraft>,
    preamble_lines: usize,
}

impl<'n> CorpusParser<'n> {
    pub fn new(normalizer: &'n Normalizer, max_lines: LineLimit) -> Self {
        Self { normalizer, max_lines, open: None, preamble_lines: 0 }
    }

    /// Lines seen before the first title marker. They belong to no document
    /// and are dropped.
    pub fn preamble_lines(&self) -> usize {
        self.preamble_lines
    }

    pub fn push_line(&mut self, line: &str) -> Option<DocumentDraft> {
        if let Some(title) = marker_inner(line, "[[", "]]") {
            let finished = self.open.take().map(|d| self.flush(d));
            self.open = Some(OpenDraft { title: title.to_string(), body: String::new(), line_count: 0 });
            return finished;
        }

        let Some(draft) = self.open.as_mut() else {
            self.preamble_lines += 1;
            return None;
        };
        if self.max_lines.admits(draft.line_count) {
            let text = marker_inner(line, "==", "==").unwrap_or(line);
            if !draft.body.is_empty() {
                draft.body.push(' ');
            }
            draft.body.push_str(text);
        }
        draft.line_count += 1;
        None
    }

    pub fn finish(mut self) -> Option<DocumentDraft> {
        if self.preamble_lines > 0 {
            tracing::debug!(lines = self.preamble_lines, "dropped lines before first title");
        }
        self.open.take().map(|d| self.flush(d))
    }

    fn flush(&self, draft: OpenDraft) -> DocumentDraft {
        DocumentDraft { terms: self.normalizer.normalize(&draft.body), title: draft.title }
    }
}

/// Parse a complete sequence of lines into drafts.
pub fn parse<I, S>(lines: I, normalizer: &Normalizer, max_lines: LineLimit) -> Vec<DocumentDraft>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = CorpusParser::new(normalizer, max_lines);
    let mut drafts: Vec<DocumentDraft> = lines
        .into_iter()
        .filter_map(|line| parser.push_line(line.as_ref()))
        .collect();
    drafts.extend(parser.finish());
    drafts
}

/// Reads one line into `buf`, without its `\n` or `\r\n` terminator.
/// Returns false at end of input.
fn read_raw_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

/// Parse one readable source. Bytes that are not valid UTF-8 decode to
/// U+FFFD, which the normalizer then drops. I/O errors abort the whole
/// source, so a half-read file never yields documents. A source with no
/// title marker is a [`Error::DocumentParseAnomaly`].
pub fn parse_reader<R: BufRead>(
    name: &str,
    mut reader: R,
    normalizer: &Normalizer,
    max_lines: LineLimit,
) -> Result<Vec<DocumentDraft>> {
    let mut parser = CorpusParser::new(normalizer, max_lines);
    let mut drafts = Vec::new();
    let mut buf = Vec::new();
    let mut lossy_lines = 0usize;
    while read_raw_line(&mut reader, &mut buf)? {
        let line = String::from_utf8_lossy(&buf);
        if matches!(line, Cow::Owned(_)) {
            lossy_lines += 1;
        }
        drafts.extend(parser.push_line(&line));
    }
    if lossy_lines > 0 {
        tracing::debug!(source = %name, lines = lossy_lines, "replaced invalid UTF-8");
    }
    drafts.extend(parser.finish());
    if drafts.is_empty() {
        return Err(Error::DocumentParseAnomaly {
            source_name: name.to_string(),
            reason: "no [[title]] marker found".into(),
        });
    }
    Ok(drafts)
}

/// Supplies named corpus texts to the index builder.
pub trait CorpusSource {
    /// Where the texts come from, for diagnostics.
    fn location(&self) -> String;

    /// Name filter applied when listing, if any.
    fn filter(&self) -> Option<&str> {
        None
    }

    /// Names of every text to index, in indexing order. Implementations
    /// return [`Error::CorpusNotFound`] when the location does not exist.
    fn names(&self) -> Result<Vec<String>>;

    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>>;
}

/// In-memory corpus, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    texts: Vec<(String, Vec<u8>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_bytes(name, text.into().into_bytes())
    }

    /// Raw contents, which need not be valid UTF-8.
    pub fn with_bytes(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.texts.push((name.into(), bytes.into()));
        self
    }
}

impl CorpusSource for MemorySource {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.texts.iter().map(|(n, _)| n.clone()).collect())
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| Box::new(Cursor::new(bytes.as_slice())) as Box<dyn BufRead + '_>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no text named {name}")))
    }
}
