pub mod analyzer;
pub mod evaluate;
pub mod matrix;
pub mod serde;
pub mod stats;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use indexmap::IndexSet;
use num::Num;
use rayon::prelude::*;

use crate::config::IndexConfig;
use crate::utils::math::vector::ZeroSpVec;
use crate::vectorizer::{
    analyzer::Analyzer,
    matrix::EmbeddingMatrix,
    stats::CorpusStats,
    tfidf::{DefaultTFIDFEngine, TFIDFEngine},
    token::TokenFrequency,
};

/// Fitted TF-IDF model.
///
/// Column `i` of every vector it produces is `vocabulary[i]`; the vocabulary
/// is kept in alphabetical order. Immutable once fitted, share it via `Arc`.
#[derive(Debug, Clone)]
pub struct TFIDFVectorizer<N = f32, E = DefaultTFIDFEngine>
where
    N: Num + Copy + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    /// Feature names, index = column
    pub vocabulary: IndexSet<String>,
    /// Smoothed IDF per column
    pub idf: Vec<f64>,
    /// Text pipeline used at fit time, reused for queries
    pub analyzer: Analyzer,
    /// Number of documents seen by fit
    pub doc_num: u64,
    _marker: PhantomData<(N, E)>,
}

impl<N, E> TFIDFVectorizer<N, E>
where
    N: Num + Copy + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    pub(crate) fn from_parts(vocabulary: IndexSet<String>, idf: Vec<f64>, analyzer: Analyzer, doc_num: u64) -> Self {
        Self {
            vocabulary,
            idf,
            analyzer,
            doc_num,
            _marker: PhantomData,
        }
    }

    /// Learn vocabulary and IDF from `texts`, and return the document-term
    /// matrix with one row per text in input order.
    pub fn fit_transform<S>(texts: &[S], config: &IndexConfig) -> (Self, EmbeddingMatrix<N>)
    where
        S: AsRef<str> + Sync,
    {
        let analyzer = Analyzer::from_config(config);
        // 文書ごとの解析は並列、collect で順序は保たれる
        let freqs: Vec<TokenFrequency> = texts
            .par_iter()
            .map(|text| analyzer.token_frequency(text.as_ref()))
            .collect();

        let stats = CorpusStats::from_frequencies(&freqs);
        let vocabulary: IndexSet<String> = stats
            .select_vocabulary(config.max_features)
            .into_iter()
            .collect();
        if vocabulary.is_empty() && !texts.is_empty() {
            tracing::warn!("empty vocabulary: every document is empty or only stop words");
        }
        let idf = E::idf_vec(&stats, &vocabulary);
        tracing::debug!(
            documents = stats.get_doc_num(),
            seen_terms = stats.vocab_size(),
            kept_terms = vocabulary.len(),
            "vectorizer fitted"
        );

        let rows: Vec<ZeroSpVec<N>> = freqs
            .par_iter()
            .map(|freq| {
                let mut row = E::tf_idf_vec(freq, &vocabulary, &idf);
                row.shrink_to_fit();
                row
            })
            .collect();

        let vectorizer = Self::from_parts(vocabulary, idf, analyzer, stats.get_doc_num());
        let matrix = EmbeddingMatrix::new(vectorizer.vocab_size(), rows);
        (vectorizer, matrix)
    }

    /// Vector of one text through the fitted vocabulary.
    /// Unknown terms contribute nothing; the result may be all zero.
    pub fn transform(&self, text: &str) -> ZeroSpVec<N> {
        let freq = self.analyzer.token_frequency(text);
        E::tf_idf_vec(&freq, &self.vocabulary, &self.idf)
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    #[inline]
    pub fn feature_name(&self, column: usize) -> Option<&str> {
        self.vocabulary.get_index(column).map(|s| s.as_str())
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.vocabulary.iter().map(|s| s.as_str()).collect()
    }

    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.vocabulary.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_features: usize) -> IndexConfig {
        IndexConfig { max_features, ..IndexConfig::default() }
    }

    #[test]
    fn fit_keeps_row_order_and_sorted_vocabulary() {
        let texts = ["kernel methods", "graph networks", "kernel graph"];
        let (vectorizer, matrix): (TFIDFVectorizer, _) = TFIDFVectorizer::fit_transform(&texts, &config(5000));

        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols(), vectorizer.vocab_size());
        let names = vectorizer.feature_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(vectorizer.contains_token("kernel methods"));

        let kernel = vectorizer.vocabulary.get_index_of("kernel").unwrap();
        let networks = vectorizer.vocabulary.get_index_of("networks").unwrap();
        assert!(matrix.row(0).unwrap()[kernel] > 0.0);
        assert_eq!(matrix.row(0).unwrap()[networks], 0.0);
        assert!(matrix.row(1).unwrap()[networks] > 0.0);
        for row in matrix.rows() {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn max_features_caps_vocabulary() {
        let texts = ["alpha beta gamma delta", "alpha beta", "alpha"];
        // totals: alpha 3, "alpha beta" 2, beta 2, the rest 1
        let (vectorizer, matrix): (TFIDFVectorizer, _) = TFIDFVectorizer::fit_transform(&texts, &config(3));
        assert_eq!(vectorizer.feature_names(), vec!["alpha", "alpha beta", "beta"]);
        assert_eq!(matrix.n_cols(), 3);
    }

    #[test]
    fn transform_ignores_unknown_terms() {
        let texts = ["kernel methods", "graph networks"];
        let (vectorizer, _): (TFIDFVectorizer, _) = TFIDFVectorizer::fit_transform(&texts, &config(5000));
        assert_eq!(vectorizer.transform("quantum chromodynamics").nnz(), 0);
        let q = vectorizer.transform("Graph");
        assert_eq!(q.nnz(), 1);
        assert_eq!(q.len(), vectorizer.vocab_size());
    }

    #[test]
    fn idf_prefers_rare_terms() {
        let texts = ["common rare", "common", "common"];
        let (vectorizer, _): (TFIDFVectorizer, _) = TFIDFVectorizer::fit_transform(&texts, &config(5000));
        let common = vectorizer.vocabulary.get_index_of("common").unwrap();
        let rare = vectorizer.vocabulary.get_index_of("rare").unwrap();
        assert!((vectorizer.idf[common] - 1.0).abs() < 1e-12);
        assert!(vectorizer.idf[rare] > vectorizer.idf[common]);
    }
}
