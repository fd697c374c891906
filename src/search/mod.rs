//! Query-time ranking over a loaded index.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paper::PaperMeta;
use crate::store::{check_alignment, ArtifactError, LoadedIndex};
use crate::vectorizer::{evaluate::scoring::Hits, matrix::EmbeddingMatrix, TFIDFVectorizer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("top_k must be at least 1")]
    InvalidTopK,
}

/// One ranked result: the paper's metadata plus its cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPaper {
    #[serde(flatten)]
    pub paper: PaperMeta,
    pub similarity: f64,
}

/// Result count for one publication year; `year: None` collects papers
/// without a known year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: Option<i32>,
    pub count: usize,
}

/// Ranks papers by cosine similarity between the query vector and each row.
///
/// Holds the loaded artifacts behind `Arc` and only takes `&self`, so one
/// engine serves any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    vectorizer: Arc<TFIDFVectorizer>,
    matrix: Arc<EmbeddingMatrix>,
    metadata: Arc<Vec<PaperMeta>>,
}

impl SearchEngine {
    pub fn new(
        vectorizer: Arc<TFIDFVectorizer>,
        matrix: Arc<EmbeddingMatrix>,
        metadata: Arc<Vec<PaperMeta>>,
    ) -> Result<Self, ArtifactError> {
        check_alignment(&vectorizer, &matrix, &metadata)?;
        Ok(Self { vectorizer, matrix, metadata })
    }

    pub fn from_index(index: LoadedIndex) -> Result<Self, ArtifactError> {
        Self::new(
            Arc::new(index.vectorizer),
            Arc::new(index.matrix),
            Arc::new(index.metadata),
        )
    }

    /// Top `top_k` papers for `query`, highest similarity first.
    ///
    /// Equal scores keep corpus order. Fewer than `top_k` papers in the
    /// corpus returns all of them; an empty corpus returns nothing.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredPaper>, SearchError> {
        if top_k == 0 {
            return Err(SearchError::InvalidTopK);
        }
        if self.matrix.is_empty() {
            return Ok(Vec::new());
        }

        // query side is only lowercased, the token pattern drops punctuation
        let query_vec = self.vectorizer.transform(&query.to_lowercase());
        if query_vec.nnz() == 0 {
            tracing::debug!(query, "query has no known terms, every score is 0");
        }

        let mut hits: Hits<usize> = self.matrix.scoring_cosine(&query_vec);
        hits.sort_by_score().truncate(top_k);

        let results: Vec<ScoredPaper> = hits
            .into_inner()
            .into_iter()
            .filter_map(|(row, similarity)| {
                self.metadata.get(row).map(|paper| ScoredPaper {
                    paper: paper.clone(),
                    similarity,
                })
            })
            .collect();
        tracing::debug!(query, top_k, returned = results.len(), "search done");
        Ok(results)
    }

    #[inline]
    pub fn corpus_size(&self) -> usize {
        self.metadata.len()
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.vectorizer.vocab_size()
    }
}

/// Result counts per year, ascending, with unknown years last.
pub fn year_distribution(results: &[ScoredPaper]) -> Vec<YearCount> {
    let mut known: BTreeMap<i32, usize> = BTreeMap::new();
    let mut unknown = 0;
    for result in results {
        match result.paper.year {
            Some(year) => *known.entry(year).or_insert(0) += 1,
            None => unknown += 1,
        }
    }
    let mut counts: Vec<YearCount> = known
        .into_iter()
        .map(|(year, count)| YearCount { year: Some(year), count })
        .collect();
    if unknown > 0 {
        counts.push(YearCount { year: None, count: unknown });
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::build;
    use crate::paper::{Corpus, CorpusLoader};

    fn engine_for(corpus: &Corpus) -> SearchEngine {
        let (vectorizer, matrix) = build(corpus, &IndexConfig::default());
        SearchEngine::new(Arc::new(vectorizer), Arc::new(matrix), Arc::new(corpus.metadata())).unwrap()
    }

    fn corpus() -> Corpus {
        CorpusLoader::load_from_reader(
            "paper_id,title,abstract,year\n\
             cnn,Deep convolutional neural networks,Image classification with convolutional networks,2012\n\
             lda,Latent dirichlet allocation,Generative topic models for text collections,2003\n\
             gk,Graph kernels,Kernel functions comparing graphs,\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn relevant_paper_ranks_first() {
        let engine = engine_for(&corpus());
        let results = engine.search("convolutional neural networks", 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].paper.paper_id, "cnn");
        assert!(results[0].similarity > 0.0);
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn top_k_larger_than_corpus_returns_everything() {
        let engine = engine_for(&corpus());
        assert_eq!(engine.search("graphs", 5).unwrap().len(), 3);
        assert_eq!(engine.search("graphs", 1).unwrap().len(), 1);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let engine = engine_for(&corpus());
        assert_eq!(engine.search("graphs", 0), Err(SearchError::InvalidTopK));
    }

    #[test]
    fn unknown_query_scores_zero_in_corpus_order() {
        let engine = engine_for(&corpus());
        let results = engine.search("zzzz qqqq", 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.paper.paper_id.as_str()).collect();
        assert_eq!(ids, vec!["cnn", "lda", "gk"]);
        assert!(results.iter().all(|r| r.similarity == 0.0));
    }

    #[test]
    fn query_is_case_insensitive() {
        let engine = engine_for(&corpus());
        let upper = engine.search("GRAPH KERNELS", 1).unwrap();
        let lower = engine.search("graph kernels", 1).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper[0].paper.paper_id, "gk");
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let engine = engine_for(&Corpus::default());
        assert!(engine.search("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn misaligned_parts_are_rejected() {
        let corpus = corpus();
        let (vectorizer, matrix) = build(&corpus, &IndexConfig::default());
        let err = SearchEngine::new(Arc::new(vectorizer), Arc::new(matrix), Arc::new(Vec::new())).unwrap_err();
        assert!(matches!(err, ArtifactError::Misaligned(_)));
    }

    #[test]
    fn years_ascending_unknown_last() {
        let engine = engine_for(&corpus());
        let results = engine.search("networks", 3).unwrap();
        assert_eq!(
            year_distribution(&results),
            vec![
                YearCount { year: Some(2003), count: 1 },
                YearCount { year: Some(2012), count: 1 },
                YearCount { year: None, count: 1 },
            ]
        );
        assert!(year_distribution(&[]).is_empty());
    }
}
