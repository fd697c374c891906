use std::cmp::Ordering;

use num::Num;

use super::ZeroSpVec;

impl<N> ZeroSpVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Dot product of two sparse vectors.
    ///
    /// Walks both index lists once, so the cost is O(nnz_a + nnz_b).
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "Vectors must be of the same length to compute dot product."
        );

        let mut result = 0_f64;
        if self.nnz() == 0 || other.nnz() == 0 {
            return result;
        }

        let mut a_it = self.raw_iter();
        let mut b_it = other.raw_iter();
        let mut a_next = a_it.next();
        let mut b_next = b_it.next();
        while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
            match ia.cmp(&ib) {
                Ordering::Equal => {
                    result += (*va).into() * (*vb).into();
                    a_next = a_it.next();
                    b_next = b_it.next();
                }
                Ordering::Less => a_next = a_it.next(),
                Ordering::Greater => b_next = b_it.next(),
            }
        }
        result
    }

    /// Dot product against a dense vector of the same logical length.
    #[inline]
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        debug_assert_eq!(self.len(), dense.len());
        self.raw_iter()
            .map(|(idx, val)| (*val).into() * dense[idx])
            .sum()
    }

    #[inline]
    pub fn norm_sq(&self) -> f64 {
        self.raw_iter()
            .map(|(_, val)| {
                let v: f64 = (*val).into();
                v * v
            })
            .sum()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// Cosine similarity
    /// cosθ = A・B / (|A||B|)
    /// Defined as 0 when either side has zero norm.
    #[inline]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        self.dot(other) / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_walks_only_shared_indices() {
        let a = ZeroSpVec::from_entries(6, vec![(0, 1.0f32), (2, 2.0), (5, 3.0)]);
        let b = ZeroSpVec::from_entries(6, vec![(2, 4.0f32), (3, 1.0), (5, 1.0)]);
        assert!((a.dot(&b) - 11.0).abs() < 1e-9);
        assert!((a.dot_dense(&[1.0, 0.0, 1.0, 0.0, 0.0, 1.0]) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        let zero: ZeroSpVec<f32> = ZeroSpVec::zeros(4);
        let doc = ZeroSpVec::from_entries(4, vec![(1, 0.5f32), (3, 0.5)]);
        assert_eq!(zero.cosine_similarity(&doc), 0.0);
        assert_eq!(doc.cosine_similarity(&zero), 0.0);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let a = ZeroSpVec::from_entries(3, vec![(0, 1.0f64), (1, 1.0)]);
        let b = ZeroSpVec::from_entries(3, vec![(0, 3.0f64), (1, 3.0)]);
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-12);
    }
}
