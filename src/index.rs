//! Offline index construction: corpus → fitted vectorizer + embedding matrix.

use std::time::Instant;

use crate::config::IndexConfig;
use crate::paper::Corpus;
use crate::store::{ArtifactError, ArtifactStore};
use crate::vectorizer::{matrix::EmbeddingMatrix, TFIDFVectorizer};

/// Fit the vectorizer on every paper's cleaned text.
/// Matrix row `i` is corpus record `i`.
pub fn build(corpus: &Corpus, config: &IndexConfig) -> (TFIDFVectorizer, EmbeddingMatrix) {
    let start = Instant::now();
    let texts = corpus.texts();
    let (vectorizer, matrix) = TFIDFVectorizer::fit_transform(&texts, config);
    tracing::info!(
        papers = matrix.n_rows(),
        vocab = vectorizer.vocab_size(),
        nnz = matrix.nnz(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "tf-idf index built"
    );
    (vectorizer, matrix)
}

/// Build and persist vectorizer, matrix and metadata table.
pub fn build_index(
    corpus: &Corpus,
    config: &IndexConfig,
    store: &ArtifactStore,
) -> Result<(TFIDFVectorizer, EmbeddingMatrix), ArtifactError> {
    let (vectorizer, matrix) = build(corpus, config);
    store.save_vectorizer(&vectorizer)?;
    store.save_matrix(&matrix)?;
    store.save_metadata(&corpus.metadata())?;
    tracing::info!(root = %store.root().display(), "index saved");
    Ok((vectorizer, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::CorpusLoader;

    const PAPERS: &str = "paper_id,title,abstract,year\n\
        p1,Convolutional networks,Image classification with convolutional layers,2015\n\
        p2,Topic models,Latent dirichlet allocation for text,2003\n\
        p3,Graph kernels,Kernel methods on graphs,2010\n";

    #[test]
    fn rows_align_with_corpus() {
        let corpus = CorpusLoader::load_from_reader(PAPERS.as_bytes()).unwrap();
        let (vectorizer, matrix) = build(&corpus, &IndexConfig::default());
        assert_eq!(matrix.n_rows(), corpus.len());

        let dirichlet = vectorizer.vocabulary.get_index_of("dirichlet").unwrap();
        let nonzero_rows: Vec<usize> = matrix
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row[dirichlet] > 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(nonzero_rows, vec![1]);
        assert!(vectorizer.contains_token("convolutional layers"));
    }

    #[test]
    fn build_index_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let corpus = CorpusLoader::load_from_reader(PAPERS.as_bytes()).unwrap();
        build_index(&corpus, &IndexConfig::default(), &store).unwrap();

        let loaded = store.load_index().unwrap();
        assert_eq!(loaded.metadata.len(), 3);
        assert_eq!(loaded.metadata[2].paper_id, "p3");
        assert_eq!(loaded.metadata[0].year, Some(2015));
    }
}
