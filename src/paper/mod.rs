pub mod loader;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use loader::CorpusLoader;

#[derive(Debug, Error)]
pub enum CorpusError {
    /// One of `paper_id` (or `id`), `title`, `abstract` is absent from the header
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed paper table: {0}")]
    Csv(#[from] csv::Error),
}

/// One cleaned paper, immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    pub paper_id: String,
    pub title: String,
    pub abstract_text: String,
    /// Author names joined with ", "
    pub authors_str: String,
    /// Referenced paper ids joined with ", "
    pub references_str: String,
    pub venue: String,
    pub year: Option<i32>,
    pub n_citation: u64,
    /// `clean(title + " " + abstract)`, the text that gets indexed
    pub text_clean: String,
}

impl PaperRecord {
    /// Metadata projection persisted alongside the embedding matrix.
    pub fn meta(&self) -> PaperMeta {
        PaperMeta {
            paper_id: self.paper_id.clone(),
            title: self.title.clone(),
            authors_str: self.authors_str.clone(),
            venue: self.venue.clone(),
            year: self.year,
            n_citation: self.n_citation,
            references_str: self.references_str.clone(),
            abstract_text: self.abstract_text.clone(),
        }
    }
}

/// Row of `papers_metadata.csv`. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMeta {
    pub paper_id: String,
    pub title: String,
    pub authors_str: String,
    pub venue: String,
    pub year: Option<i32>,
    pub n_citation: u64,
    pub references_str: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Ordered paper collection. Row `i` here is row `i` of every artifact.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<PaperRecord>,
}

impl Corpus {
    pub fn new(records: Vec<PaperRecord>) -> Self {
        Self { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[PaperRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaperRecord> + '_ {
        self.records.iter()
    }

    /// Cleaned texts in corpus order
    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.text_clean.as_str()).collect()
    }

    pub fn metadata(&self) -> Vec<PaperMeta> {
        self.records.iter().map(PaperRecord::meta).collect()
    }
}
