//! Sentence-level lemmatization.
//!
//! The normalizer treats lemmatization as a pure text → base-form-tokens
//! function. [`DictionaryLemmatizer`] is the built-in implementation: a
//! lookup table of irregular forms, optionally extended from a
//! `form<TAB>lemma` file, in front of a few regular suffix rules
//! (`-s`, `-es`, `-ies`, `-ed`, `-ing`).

use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z0-9][A-Za-z0-9,']*").expect("valid regex");
}

/// Maps text to the dictionary base form of each of its words.
pub trait Lemmatizer: Send + Sync {
    /// Returns one base-form token per word of `text`, in order.
    fn lemmas(&self, text: &str) -> Vec<String>;

    /// Lemmatizes `text` and joins the base forms with single spaces.
    fn lemmatize(&self, text: &str) -> String {
        self.lemmas(text).join(" ")
    }
}

// form, lemma
const IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"), ("been", "be"), ("being", "be"),
    ("has", "have"), ("had", "have"), ("having", "have"),
    ("does", "do"), ("did", "do"), ("done", "do"), ("doing", "do"),
    ("went", "go"), ("gone", "go"), ("goes", "go"),
    ("began", "begin"), ("begun", "begin"),
    ("became", "become"),
    ("born", "bear"), ("bore", "bear"),
    ("broke", "break"), ("broken", "break"),
    ("brought", "bring"),
    ("built", "build"),
    ("bought", "buy"),
    ("came", "come"),
    ("chose", "choose"), ("chosen", "choose"),
    ("drew", "draw"), ("drawn", "draw"),
    ("drove", "drive"), ("driven", "drive"),
    ("ate", "eat"), ("eaten", "eat"),
    ("fell", "fall"), ("fallen", "fall"),
    ("fought", "fight"),
    ("flew", "fly"), ("flown", "fly"), ("flies", "fly"),
    ("forgot", "forget"), ("forgotten", "forget"),
    ("froze", "freeze"), ("frozen", "freeze"),
    ("gave", "give"), ("given", "give"),
    ("grew", "grow"), ("grown", "grow"),
    ("held", "hold"),
    ("kept", "keep"),
    ("knew", "know"), ("known", "know"),
    ("led", "lead"),
    ("left", "leave"),
    ("lost", "lose"),
    ("made", "make"),
    ("meant", "mean"),
    ("met", "meet"),
    ("paid", "pay"),
    ("ran", "run"),
    ("rose", "rise"), ("risen", "rise"),
    ("said", "say"),
    ("saw", "see"), ("seen", "see"),
    ("sold", "sell"),
    ("sent", "send"),
    ("sang", "sing"), ("sung", "sing"),
    ("sank", "sink"), ("sunk", "sink"),
    ("spoke", "speak"), ("spoken", "speak"),
    ("stood", "stand"),
    ("stole", "steal"), ("stolen", "steal"),
    ("struck", "strike"),
    ("swam", "swim"), ("swum", "swim"),
    ("took", "take"), ("taken", "take"),
    ("taught", "teach"),
    ("thought", "think"),
    ("threw", "throw"), ("thrown", "throw"),
    ("told", "tell"),
    ("understood", "understand"),
    ("woke", "wake"), ("woken", "wake"),
    ("won", "win"),
    ("wore", "wear"), ("worn", "wear"),
    ("wrote", "write"), ("written", "write"),
    ("children", "child"),
    ("men", "man"), ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"), ("teeth", "tooth"), ("geese", "goose"),
    ("mice", "mouse"),
    ("wives", "wife"), ("knives", "knife"), ("lives", "life"), ("leaves", "leaf"),
    ("wolves", "wolf"), ("halves", "half"), ("shelves", "shelf"),
    ("oxen", "ox"),
    ("cacti", "cactus"), ("fungi", "fungus"), ("nuclei", "nucleus"),
    ("criteria", "criterion"), ("phenomena", "phenomenon"),
    ("countries", "country"), ("cities", "city"), ("stories", "story"),
    ("better", "good"), ("best", "good"),
    ("worse", "bad"), ("worst", "bad"),
    ("added", "add"),
    // words the suffix rules would mangle
    ("series", "series"), ("species", "species"), ("news", "news"),
    ("physics", "physics"), ("mathematics", "mathematics"), ("politics", "politics"),
    ("always", "always"), ("perhaps", "perhaps"),
    ("during", "during"), ("morning", "morning"), ("evening", "evening"),
    ("nothing", "nothing"), ("something", "something"), ("anything", "anything"), ("everything", "everything"),
    ("hundred", "hundred"), ("united", "united"),
];

const UNDOUBLED: &[&str] = &["bb", "dd", "ff", "gg", "mm", "nn", "pp", "rr", "tt"];

fn has_vowel(s: &str) -> bool {
    s.contains(['a', 'e', 'i', 'o', 'u', 'y'])
}

fn undouble(stem: &str) -> String {
    if UNDOUBLED.iter().any(|d| stem.ends_with(d)) {
        stem[..stem.len() - 1].to_string()
    } else {
        stem.to_string()
    }
}

/// One regular suffix rule applied to a lowercase ASCII word, if any fits.
fn strip_inflection(word: &str) -> Option<String> {
    let n = word.len();
    if n >= 5 && word.ends_with("ies") {
        return Some(format!("{}y", &word[..n - 3]));
    }
    if n >= 5 && ["sses", "xes", "zes", "ches", "shes"].iter().any(|s| word.ends_with(s)) {
        return Some(word[..n - 2].to_string());
    }
    if n >= 4 && word.ends_with('s') && !["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
        return Some(word[..n - 1].to_string());
    }
    if n >= 6 && word.ends_with("ing") {
        let stem = &word[..n - 3];
        if has_vowel(stem) {
            return Some(undouble(stem));
        }
    }
    if n >= 5 && word.ends_with("ed") {
        let stem = &word[..n - 2];
        if stem.len() >= 3 && !stem.ends_with('e') && has_vowel(stem) {
            return Some(undouble(stem));
        }
    }
    None
}

/// Table-driven lemmatizer with regular suffix rules.
///
/// Table lookups are case-insensitive and return the lowercase lemma. Words
/// with no entry go through the suffix rules only when written entirely in
/// lowercase ASCII letters, so proper nouns such as `Athens` are kept as
/// written. Every lemma of the table is a fixed point and never a key, so
/// `lemmas(lemmatize(t)) == lemmas(t)`.
#[derive(Debug, Clone)]
pub struct DictionaryLemmatizer {
    table: HashMap<String, String>,
    lemmas: HashSet<String>,
}

impl Default for DictionaryLemmatizer {
    fn default() -> Self {
        Self::from_pairs(IRREGULAR.iter().map(|(f, l)| (f.to_string(), l.to_string())))
    }
}

impl DictionaryLemmatizer {
    /// Builds a lemmatizer from `(form, lemma)` pairs. Later pairs win.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut table: HashMap<String, String> = HashMap::new();
        for (form, lemma) in pairs {
            table.insert(form.to_lowercase(), lemma.to_lowercase());
        }
        Self::closed(table)
    }

    /// Parses a tab-separated `form<TAB>lemma` listing. Blank lines and
    /// lines starting with `#` are ignored, as are lines without a tab.
    pub fn parse_table(text: &str) -> Self {
        let pairs = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split_once('\t'))
            .map(|(f, l)| (f.trim().to_string(), l.trim().to_string()));
        Self::from_pairs(pairs)
    }

    /// Built-in table extended (and overridden) by the entries in `path`.
    pub fn with_table_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let extra = Self::parse_table(&text);
        let mut table = Self::default().table;
        table.extend(extra.table);
        Ok(Self::closed(table))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn lemma_of(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if let Some(lemma) = self.table.get(&lower) {
            return lemma.clone();
        }
        if !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word.to_string();
        }
        let mut current = lower;
        while !self.lemmas.contains(&current) {
            let Some(next) = strip_inflection(&current) else { break };
            if let Some(lemma) = self.table.get(&next) {
                return lemma.clone();
            }
            current = next;
        }
        current
    }

    // Drops every entry whose form is itself some lemma, keeping base forms
    // as fixed points.
    fn closed(mut table: HashMap<String, String>) -> Self {
        let lemmas: HashSet<String> = table.values().cloned().collect();
        for lemma in &lemmas {
            table.remove(lemma);
        }
        Self { table, lemmas }
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn lemmas(&self, text: &str) -> Vec<String> {
        WORD.find_iter(text)
            .map(|m| m.as_str().trim_end_matches([',', '\'']))
            .filter(|w| !w.is_empty())
            .map(|w| self.lemma_of(w))
            .collect()
    }
}
