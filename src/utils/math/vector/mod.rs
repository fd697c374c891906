pub mod math;
pub mod serde;

use std::fmt::{self, Debug};
use std::ops::Index;

use num::Num;

/// ZeroSpVec is a sparse vector that treats zero elements as implicit.
/// It holds `indices` and `values`:
/// indices keep the logical position of each stored element,
/// values keep the element itself.
///
/// Stored elements are guaranteed to be sorted by ascending index,
/// and no stored value is zero.
#[derive(Clone, PartialEq)]
pub struct ZeroSpVec<N>
where N: Num
{
    ind: Vec<usize>,
    val: Vec<N>,
    len: usize,
    zero: N,
}

impl<N> ZeroSpVec<N>
where N: Num + Copy
{
    #[inline]
    fn ind_binary_search(&self, index: &usize) -> Result<usize, usize> {
        self.ind.binary_search(index)
    }

    #[inline]
    pub fn new() -> Self {
        ZeroSpVec {
            ind: Vec::new(),
            val: Vec::new(),
            len: 0,
            zero: N::zero(),
        }
    }

    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        ZeroSpVec {
            ind: Vec::with_capacity(cap),
            val: Vec::with_capacity(cap),
            len: 0,
            zero: N::zero(),
        }
    }

    /// Empty vector with `len` logical zero elements.
    #[inline]
    pub fn zeros(len: usize) -> Self {
        let mut vec = ZeroSpVec::new();
        vec.len = len;
        vec
    }

    /// Build from `(index, value)` pairs in any order.
    /// Duplicate indices are summed, zeros are dropped.
    pub fn from_entries(len: usize, mut entries: Vec<(usize, N)>) -> Self {
        entries.sort_by_key(|(idx, _)| *idx);
        let mut vec = ZeroSpVec::with_capacity(entries.len());
        vec.len = len;
        for (idx, value) in entries {
            debug_assert!(idx < len, "index out of bounds");
            match vec.ind.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = vec.val.last_mut() {
                        *v = *v + value;
                    }
                }
                _ => vec.raw_push(idx, value),
            }
        }
        vec.retain_non_zero();
        vec
    }

    /// raw_push appends a stored element without touching `len`.
    /// The caller must push in ascending index order.
    #[inline]
    pub(crate) fn raw_push(&mut self, index: usize, value: N) {
        debug_assert!(self.ind.last().map_or(true, |&last| last < index));
        self.ind.push(index);
        self.val.push(value);
    }

    #[inline]
    fn retain_non_zero(&mut self) {
        if self.val.iter().all(|v| *v != N::zero()) {
            return;
        }
        let (ind, val): (Vec<usize>, Vec<N>) = self.ind.iter().copied()
            .zip(self.val.iter().copied())
            .filter(|(_, v)| *v != N::zero())
            .unzip();
        self.ind = ind;
        self.val = val;
    }

    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.ind.shrink_to_fit();
        self.val.shrink_to_fit();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.ind.len()
    }

    #[inline]
    pub fn push(&mut self, elem: N) {
        if elem != N::zero() {
            self.ind.push(self.len);
            self.val.push(elem);
        }
        self.len += 1;
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&N> {
        if index >= self.len {
            return None;
        }
        match self.ind_binary_search(&index) {
            Ok(idx) => Some(&self.val[idx]),
            Err(_) => Some(&self.zero),
        }
    }

    #[inline]
    pub fn from_vec(vec: Vec<N>) -> Self {
        let mut zero_sp_vec = ZeroSpVec::with_capacity(vec.len());
        for entry in vec {
            zero_sp_vec.push(entry);
        }
        zero_sp_vec
    }

    /// Dense copy, used to seed centroids.
    pub fn to_dense(&self) -> Vec<N> {
        let mut dense = vec![N::zero(); self.len];
        for (idx, val) in self.raw_iter() {
            dense[idx] = *val;
        }
        dense
    }

    /// Logical iterator, zeros included. Backs the `Debug` list form.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &N> + '_ {
        (0..self.len).map(move |i| match self.ind_binary_search(&i) {
            Ok(idx) => &self.val[idx],
            Err(_) => &self.zero,
        })
    }

    /// Stored elements only, as `(index, &value)` in ascending index order.
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, &N)> + '_ {
        self.ind.iter().copied().zip(self.val.iter())
    }

}

impl<N> Default for ZeroSpVec<N>
where N: Num + Copy
{
    #[inline]
    fn default() -> Self {
        ZeroSpVec::new()
    }
}

impl<N> Index<usize> for ZeroSpVec<N>
where N: Num + Copy
{
    type Output = N;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("index out of bounds")
    }
}

impl<N: Num + Copy + Debug> Debug for ZeroSpVec<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_struct("ZeroSpVec")
                .field("len", &self.len)
                .field("nnz", &self.nnz())
                .field("entries", &self.raw_iter().collect::<Vec<_>>())
                .finish()
        } else {
            f.debug_list().entries(self.iter()).finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_skips_zero_but_counts_len() {
        let v = ZeroSpVec::from_vec(vec![0.0f32, 1.5, 0.0, 2.0]);
        assert_eq!(v.len(), 4);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[1], 1.5);
        assert_eq!(v.get(4), None);
    }

    #[test]
    fn from_entries_sorts_and_merges_duplicates() {
        let v = ZeroSpVec::from_entries(5, vec![(3, 1.0f64), (1, 2.0), (3, 0.5), (4, 0.0)]);
        let entries: Vec<(usize, f64)> = v.raw_iter().map(|(i, x)| (i, *x)).collect();
        assert_eq!(entries, vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn debug_lists_logical_elements() {
        let v = ZeroSpVec::from_entries(3, vec![(1, 2.0f32)]);
        assert_eq!(format!("{:?}", v), "[0.0, 2.0, 0.0]");
    }
}
