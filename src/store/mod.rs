//! On-disk artifacts under the models directory.
//!
//! Binary models are CBOR, tables are CSV. Every load failure names the file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::cluster::{ClusterSummary, ClusteredPaper};
use crate::paper::PaperMeta;
use crate::vectorizer::{matrix::EmbeddingMatrix, serde::TFIDFData, TFIDFVectorizer};

pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.cbor";
pub const EMBEDDINGS_FILE: &str = "abstract_embeddings.cbor";
pub const METADATA_FILE: &str = "papers_metadata.csv";
pub const CLUSTERED_PAPERS_FILE: &str = "papers_with_clusters.csv";
pub const CLUSTER_SUMMARY_FILE: &str = "cluster_summary.csv";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact {path} is not valid CBOR: {source}")]
    Cbor {
        path: PathBuf,
        #[source]
        source: serde_cbor::Error,
    },
    #[error("artifact {path} is not a valid table: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// Artifacts disagree on row or column counts
    #[error("artifacts are misaligned: {0}")]
    Misaligned(String),
}

/// Everything the search side needs, loaded together.
#[derive(Debug)]
pub struct LoadedIndex {
    pub vectorizer: TFIDFVectorizer,
    pub matrix: EmbeddingMatrix,
    pub metadata: Vec<PaperMeta>,
}

/// File layout of one models directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn ensure_root(&self) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.root).map_err(|source| ArtifactError::Io {
            path: self.root.clone(),
            source,
        })
    }

    pub fn save_vectorizer(&self, vectorizer: &TFIDFVectorizer) -> Result<PathBuf, ArtifactError> {
        self.write_cbor(VECTORIZER_FILE, vectorizer)
    }

    pub fn load_vectorizer(&self) -> Result<TFIDFVectorizer, ArtifactError> {
        let data: TFIDFData = self.read_cbor(VECTORIZER_FILE)?;
        data.into_tf_idf_vectorizer().map_err(ArtifactError::Misaligned)
    }

    pub fn save_matrix(&self, matrix: &EmbeddingMatrix) -> Result<PathBuf, ArtifactError> {
        self.write_cbor(EMBEDDINGS_FILE, matrix)
    }

    pub fn load_matrix(&self) -> Result<EmbeddingMatrix, ArtifactError> {
        let matrix: EmbeddingMatrix = self.read_cbor(EMBEDDINGS_FILE)?;
        if let Some(row) = matrix.find_ragged_row() {
            return Err(ArtifactError::Misaligned(format!(
                "row {} of {} does not have {} columns",
                row, EMBEDDINGS_FILE, matrix.n_cols()
            )));
        }
        Ok(matrix)
    }

    pub fn save_metadata(&self, metadata: &[PaperMeta]) -> Result<PathBuf, ArtifactError> {
        self.write_csv(METADATA_FILE, metadata)
    }

    pub fn load_metadata(&self) -> Result<Vec<PaperMeta>, ArtifactError> {
        self.read_csv(METADATA_FILE)
    }

    pub fn save_clustered_papers(&self, papers: &[ClusteredPaper]) -> Result<PathBuf, ArtifactError> {
        self.write_csv(CLUSTERED_PAPERS_FILE, papers)
    }

    pub fn load_clustered_papers(&self) -> Result<Vec<ClusteredPaper>, ArtifactError> {
        self.read_csv(CLUSTERED_PAPERS_FILE)
    }

    pub fn save_cluster_summary(&self, summaries: &[ClusterSummary]) -> Result<PathBuf, ArtifactError> {
        self.write_csv(CLUSTER_SUMMARY_FILE, summaries)
    }

    pub fn load_cluster_summary(&self) -> Result<Vec<ClusterSummary>, ArtifactError> {
        self.read_csv(CLUSTER_SUMMARY_FILE)
    }

    /// Load vectorizer, matrix and metadata and check that they line up.
    pub fn load_index(&self) -> Result<LoadedIndex, ArtifactError> {
        let vectorizer = self.load_vectorizer()?;
        let matrix = self.load_matrix()?;
        let metadata = self.load_metadata()?;
        check_alignment(&vectorizer, &matrix, &metadata)?;
        tracing::info!(
            root = %self.root.display(),
            papers = metadata.len(),
            vocab = vectorizer.vocab_size(),
            "index artifacts loaded"
        );
        Ok(LoadedIndex { vectorizer, matrix, metadata })
    }

    fn write_cbor<T: Serialize>(&self, file: &str, value: &T) -> Result<PathBuf, ArtifactError> {
        self.ensure_root()?;
        let path = self.path(file);
        let io_err = |source| ArtifactError::Io { path: path.clone(), source };
        let mut out = BufWriter::new(File::create(&path).map_err(io_err)?);
        serde_cbor::to_writer(&mut out, value)
            .map_err(|source| ArtifactError::Cbor { path: path.clone(), source })?;
        out.flush().map_err(io_err)?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(path)
    }

    fn read_cbor<T: DeserializeOwned>(&self, file: &str) -> Result<T, ArtifactError> {
        let path = self.path(file);
        let input = File::open(&path).map_err(|source| ArtifactError::Io { path: path.clone(), source })?;
        serde_cbor::from_reader(BufReader::new(input)).map_err(|source| ArtifactError::Cbor { path, source })
    }

    fn write_csv<T: Serialize>(&self, file: &str, rows: &[T]) -> Result<PathBuf, ArtifactError> {
        self.ensure_root()?;
        let path = self.path(file);
        let csv_err = |source| ArtifactError::Csv { path: path.clone(), source };
        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| ArtifactError::Io { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "wrote table");
        Ok(path)
    }

    fn read_csv<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, ArtifactError> {
        let path = self.path(file);
        let csv_err = |source| ArtifactError::Csv { path: path.clone(), source };
        let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<T>, csv::Error>>()
            .map_err(csv_err)?;
        Ok(rows)
    }
}

/// Row i of the matrix must describe metadata row i, and every row must span
/// the vectorizer's vocabulary.
pub fn check_alignment(
    vectorizer: &TFIDFVectorizer,
    matrix: &EmbeddingMatrix,
    metadata: &[PaperMeta],
) -> Result<(), ArtifactError> {
    if matrix.n_rows() != metadata.len() {
        return Err(ArtifactError::Misaligned(format!(
            "matrix has {} rows but metadata has {}",
            matrix.n_rows(),
            metadata.len()
        )));
    }
    if matrix.n_cols() != vectorizer.vocab_size() {
        return Err(ArtifactError::Misaligned(format!(
            "matrix has {} columns but vocabulary has {} terms",
            matrix.n_cols(),
            vectorizer.vocab_size()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;

    fn meta(id: &str, year: Option<i32>) -> PaperMeta {
        PaperMeta {
            paper_id: id.to_string(),
            title: format!("Title {id}"),
            authors_str: "A. Author, B. Author".to_string(),
            venue: String::new(),
            year,
            n_citation: 3,
            references_str: String::new(),
            abstract_text: "An abstract, with a comma".to_string(),
        }
    }

    #[test]
    fn index_artifacts_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));

        let texts = ["bayesian inference", "variational inference"];
        let (vectorizer, matrix): (TFIDFVectorizer, EmbeddingMatrix) =
            TFIDFVectorizer::fit_transform(&texts, &IndexConfig::default());
        let metadata = vec![meta("p1", Some(2011)), meta("p2", None)];

        store.save_vectorizer(&vectorizer).unwrap();
        store.save_matrix(&matrix).unwrap();
        store.save_metadata(&metadata).unwrap();

        let loaded = store.load_index().unwrap();
        assert_eq!(loaded.vectorizer.vocabulary, vectorizer.vocabulary);
        assert_eq!(loaded.matrix, matrix);
        assert_eq!(loaded.metadata, metadata);
    }

    #[test]
    fn metadata_header_uses_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.save_metadata(&[meta("p1", Some(2020))]).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "paper_id,title,authors_str,venue,year,n_citation,references_str,abstract");
    }

    #[test]
    fn missing_artifact_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.load_vectorizer().unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
        assert!(err.to_string().contains(VECTORIZER_FILE));
    }

    #[test]
    fn misaligned_artifacts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (vectorizer, matrix): (TFIDFVectorizer, EmbeddingMatrix) =
            TFIDFVectorizer::fit_transform(&["one document"], &IndexConfig::default());
        store.save_vectorizer(&vectorizer).unwrap();
        store.save_matrix(&matrix).unwrap();
        store.save_metadata(&[meta("p1", None), meta("p2", None)]).unwrap();
        assert!(matches!(store.load_index(), Err(ArtifactError::Misaligned(_))));
    }
}
