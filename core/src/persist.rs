use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{Document, InvertedIndex, Posting};
use crate::normalize::NormalizerKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    pub normalizer: NormalizerKind,
    /// Options the index was built with.
    pub config: Config,
}

impl MetaFile {
    pub fn describe(index: &InvertedIndex, config: &Config) -> Self {
        Self {
            num_docs: index.num_docs() as u32,
            num_terms: index.num_terms() as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
            normalizer: index.normalizer_kind(),
            config: config.clone(),
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// True when all index files are present.
    pub fn exists(&self) -> bool {
        self.meta().is_file() && self.postings().is_file() && self.docs().is_file()
    }
}

fn write_bincode<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn read_bincode<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let f = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(f)?)
}

pub fn save_postings(paths: &IndexPaths, postings: &HashMap<String, Vec<Posting>>) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.postings(), postings)
}

pub fn load_postings(paths: &IndexPaths) -> Result<HashMap<String, Vec<Posting>>> {
    read_bincode(&paths.postings())
}

pub fn save_docs(paths: &IndexPaths, docs: &[Document]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.docs(), docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<Document>> {
    read_bincode(&paths.docs())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let f = BufReader::new(File::open(paths.meta())?);
    let meta: MetaFile = serde_json::from_reader(f)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::IndexVersion { path: paths.root.clone(), found: meta.version, expected: FORMAT_VERSION });
    }
    Ok(meta)
}

/// Write postings, documents and `meta.json` under `paths.root`.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex, config: &Config) -> Result<MetaFile> {
    save_postings(paths, &index.postings)?;
    save_docs(paths, &index.docs)?;
    let meta = MetaFile::describe(index, config);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), documents = meta.num_docs, "index saved");
    Ok(meta)
}

pub fn load_index(paths: &IndexPaths) -> Result<(InvertedIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    let index = InvertedIndex {
        postings: load_postings(paths)?,
        docs: load_docs(paths)?,
        normalizer: meta.normalizer,
    };
    if index.num_docs() != meta.num_docs as usize {
        return Err(Error::InvalidConfig(format!(
            "index at {} lists {} documents but holds {}",
            paths.root.display(),
            meta.num_docs,
            index.num_docs()
        )));
    }
    tracing::info!(root = %paths.root.display(), documents = meta.num_docs, terms = meta.num_terms, "index loaded");
    Ok((index, meta))
}
