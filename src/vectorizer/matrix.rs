use num::Num;
use serde::{Deserialize, Serialize};

use crate::utils::math::vector::ZeroSpVec;

/// Document-term matrix, one sparse L2-normalized row per paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "N: Num + Copy + Serialize",
    deserialize = "N: Num + Copy + Deserialize<'de>"
))]
pub struct EmbeddingMatrix<N = f32>
where
    N: Num + Copy,
{
    n_cols: usize,
    rows: Vec<ZeroSpVec<N>>,
}

impl<N> EmbeddingMatrix<N>
where
    N: Num + Copy,
{
    pub fn new(n_cols: usize, rows: Vec<ZeroSpVec<N>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == n_cols));
        Self { n_cols, rows }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn row(&self, idx: usize) -> Option<&ZeroSpVec<N>> {
        self.rows.get(idx)
    }

    #[inline]
    pub fn rows(&self) -> &[ZeroSpVec<N>] {
        &self.rows
    }

    /// First row whose logical length disagrees with `n_cols`, if any.
    pub fn find_ragged_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.len() != self.n_cols)
    }

    /// Stored non-zeros over all rows
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.nnz()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_reported() {
        let good = EmbeddingMatrix::new(3, vec![ZeroSpVec::from_vec(vec![1.0f32, 0.0, 0.0])]);
        assert_eq!(good.find_ragged_row(), None);
        assert_eq!(good.nnz(), 1);

        let json = r#"{"n_cols":3,"rows":[{"len":3,"nnz":0,"entries":[]},{"len":2,"nnz":0,"entries":[]}]}"#;
        let bad: EmbeddingMatrix<f32> = serde_json::from_str(json).unwrap();
        assert_eq!(bad.find_ragged_row(), Some(1));
    }
}
