//! Topic clusters over the embedding matrix.

pub mod minibatch;
pub mod summary;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClusterConfig;
use crate::paper::PaperMeta;
use crate::store::{check_alignment, ArtifactError, ArtifactStore};
use crate::vectorizer::{matrix::EmbeddingMatrix, TFIDFVectorizer};

pub use minibatch::{KMeansFit, MiniBatchKMeans};
pub use summary::ClusterSummary;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot build {requested} clusters from {documents} documents")]
    InvalidClusterCount { requested: usize, documents: usize },
    #[error("cluster input is misaligned: {0}")]
    Misaligned(String),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Row of `papers_with_clusters.csv`: the metadata columns plus `cluster`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredPaper {
    pub paper_id: String,
    pub title: String,
    pub authors_str: String,
    pub venue: String,
    pub year: Option<i32>,
    pub n_citation: u64,
    pub references_str: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub cluster: usize,
}

impl ClusteredPaper {
    pub fn new(meta: &PaperMeta, cluster: usize) -> Self {
        Self {
            paper_id: meta.paper_id.clone(),
            title: meta.title.clone(),
            authors_str: meta.authors_str.clone(),
            venue: meta.venue.clone(),
            year: meta.year,
            n_citation: meta.n_citation,
            references_str: meta.references_str.clone(),
            abstract_text: meta.abstract_text.clone(),
            cluster,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterOutput {
    /// Cluster id per paper, in corpus order
    pub labels: Vec<usize>,
    pub papers: Vec<ClusteredPaper>,
    /// One entry per cluster id `0..k`
    pub summaries: Vec<ClusterSummary>,
}

/// Cluster every row of `matrix` and summarize each cluster.
pub fn cluster(
    matrix: &EmbeddingMatrix,
    vectorizer: &TFIDFVectorizer,
    metadata: &[PaperMeta],
    config: &ClusterConfig,
) -> Result<ClusterOutput, ClusterError> {
    check_alignment(vectorizer, matrix, metadata).map_err(|e| match e {
        ArtifactError::Misaligned(msg) => ClusterError::Misaligned(msg),
        other => ClusterError::Artifact(other),
    })?;

    tracing::info!(
        n_clusters = config.n_clusters,
        batch_size = config.batch_size,
        n_init = config.n_init,
        seed = config.seed,
        papers = matrix.n_rows(),
        "running mini-batch k-means"
    );
    let fit = MiniBatchKMeans::from(config).fit(matrix.rows())?;
    tracing::info!(inertia = fit.inertia, steps = fit.n_steps, "k-means finished");

    let summaries = summary::summarize(&fit.centers, &fit.labels, metadata, vectorizer, config.top_terms);
    let papers = metadata
        .iter()
        .zip(&fit.labels)
        .map(|(meta, &label)| ClusteredPaper::new(meta, label))
        .collect();

    Ok(ClusterOutput {
        labels: fit.labels,
        papers,
        summaries,
    })
}

/// Load index artifacts, cluster, and persist the clustered table and summary.
pub fn build_clusters(store: &ArtifactStore, config: &ClusterConfig) -> Result<ClusterOutput, ClusterError> {
    let vectorizer = store.load_vectorizer()?;
    let matrix = store.load_matrix()?;
    let metadata = store.load_metadata()?;

    let output = cluster(&matrix, &vectorizer, &metadata, config)?;
    let papers_path = store.save_clustered_papers(&output.papers)?;
    let summary_path = store.save_cluster_summary(&output.summaries)?;
    tracing::info!(
        papers = %papers_path.display(),
        summary = %summary_path.display(),
        "cluster artifacts saved"
    );
    Ok(output)
}
