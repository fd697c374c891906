use num::Num;
use rayon::prelude::*;

use crate::{utils::math::vector::ZeroSpVec, vectorizer::matrix::EmbeddingMatrix};

/// Structure to store search results
pub struct Hits<K>
{
    /// (Document key, Score)
    pub list: Vec<(K, f64)>,
}

impl<K> Hits<K> {
    /// Create a new Hits instance
    pub fn new(vec: Vec<(K, f64)>) -> Self {
        Hits { list: vec }
    }

    /// Sort results by descending score
    /// Stable: equal scores keep their input order
    pub fn sort_by_score(&mut self) -> &mut Self {
        // Remove NaN scores
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| b.1.total_cmp(&a.1));
        self
    }

    /// Keep only the first `k` hits
    pub fn truncate(&mut self, k: usize) -> &mut Self {
        self.list.truncate(k);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn into_inner(self) -> Vec<(K, f64)> {
        self.list
    }
}

impl<N> EmbeddingMatrix<N>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    /// Cosine similarity of `query` against every row, keyed by row index,
    /// in row order. Rows are scored in parallel.
    pub fn scoring_cosine(&self, query: &ZeroSpVec<N>) -> Hits<usize> {
        let scores: Vec<(usize, f64)> = self
            .rows()
            .par_iter()
            .enumerate()
            .map(|(idx, row)| (idx, query.cosine_similarity(row)))
            .collect();
        Hits::new(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_is_stable_for_ties() {
        let mut hits = Hits::new(vec![(0usize, 0.5), (1, 0.9), (2, 0.5), (3, f64::NAN), (4, 0.9)]);
        hits.sort_by_score();
        let order: Vec<usize> = hits.list.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![1, 4, 0, 2]);
        hits.truncate(2);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn cosine_scores_follow_row_order() {
        let matrix = EmbeddingMatrix::new(
            3,
            vec![
                ZeroSpVec::from_vec(vec![1.0f32, 0.0, 0.0]),
                ZeroSpVec::zeros(3),
                ZeroSpVec::from_vec(vec![0.6f32, 0.8, 0.0]),
            ],
        );
        let query = ZeroSpVec::from_vec(vec![2.0f32, 0.0, 0.0]);
        let hits = matrix.scoring_cosine(&query).into_inner();
        assert_eq!(hits[0], (0, 1.0));
        assert_eq!(hits[1], (1, 0.0));
        assert!((hits[2].1 - 0.6).abs() < 1e-6);

        let zero = matrix.scoring_cosine(&ZeroSpVec::zeros(3)).into_inner();
        assert!(zero.iter().all(|(_, s)| *s == 0.0));
    }
}
