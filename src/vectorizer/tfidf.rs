use indexmap::IndexSet;
use num::Num;

use crate::utils::math::vector::ZeroSpVec;
use crate::vectorizer::{stats::CorpusStats, token::TokenFrequency};

pub trait TFIDFEngine<N>
where
    N: Num,
{
    /// IDFベクトルを生成するメソッド
    /// # Arguments
    /// * `stats` - コーパス統計
    /// * `vocabulary` - 列順の語彙
    /// # Returns
    /// * `Vec<f64>` - 列ごとのIDF
    fn idf_vec(stats: &CorpusStats, vocabulary: &IndexSet<String>) -> Vec<f64>;

    /// TF-IDFベクトルを生成するメソッド
    /// 語彙に無いtokenは無視されます
    /// # Arguments
    /// * `freq` - 文書のtoken頻度
    /// * `vocabulary` - 列順の語彙
    /// * `idf` - `idf_vec`の結果
    fn tf_idf_vec(freq: &TokenFrequency, vocabulary: &IndexSet<String>, idf: &[f64]) -> ZeroSpVec<N>;
}

/// デフォルトのTF-IDFエンジン
/// `f32`、`f64`の型に対応
///
/// - TF: 生のカウント
/// - IDF: `ln((1 + n) / (1 + df)) + 1` (smoothing)
/// - 行ベクトルは L2 正規化
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl DefaultTFIDFEngine {
    /// 平滑化IDF
    #[inline]
    pub fn smooth_idf(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }

    /// (列, 重み) を L2 正規化して返す
    fn weighted_entries(freq: &TokenFrequency, vocabulary: &IndexSet<String>, idf: &[f64]) -> Vec<(usize, f64)> {
        if freq.is_empty() {
            return Vec::new();
        }
        let mut entries: Vec<(usize, f64)> = freq
            .iter()
            .filter_map(|(token, count)| {
                vocabulary
                    .get_index_of(token)
                    .map(|col| (col, count as f64 * idf[col]))
            })
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }
        entries
    }

    fn idf_from_stats(stats: &CorpusStats, vocabulary: &IndexSet<String>) -> Vec<f64> {
        let doc_num = stats.get_doc_num();
        vocabulary
            .iter()
            .map(|term| Self::smooth_idf(doc_num, stats.get_doc_freq(term)))
            .collect()
    }
}

impl TFIDFEngine<f32> for DefaultTFIDFEngine
{
    fn idf_vec(stats: &CorpusStats, vocabulary: &IndexSet<String>) -> Vec<f64> {
        Self::idf_from_stats(stats, vocabulary)
    }

    fn tf_idf_vec(freq: &TokenFrequency, vocabulary: &IndexSet<String>, idf: &[f64]) -> ZeroSpVec<f32> {
        let entries = Self::weighted_entries(freq, vocabulary, idf)
            .into_iter()
            .map(|(col, w)| (col, w as f32))
            .collect();
        ZeroSpVec::from_entries(vocabulary.len(), entries)
    }
}

impl TFIDFEngine<f64> for DefaultTFIDFEngine
{
    fn idf_vec(stats: &CorpusStats, vocabulary: &IndexSet<String>) -> Vec<f64> {
        Self::idf_from_stats(stats, vocabulary)
    }

    fn tf_idf_vec(freq: &TokenFrequency, vocabulary: &IndexSet<String>, idf: &[f64]) -> ZeroSpVec<f64> {
        ZeroSpVec::from_entries(vocabulary.len(), Self::weighted_entries(freq, vocabulary, idf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> IndexSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn smoothed_idf_matches_formula() {
        // 全文書に出るtermでも重みは1
        assert!((DefaultTFIDFEngine::smooth_idf(4, 4) - 1.0).abs() < 1e-12);
        let expected = (5.0f64 / 2.0).ln() + 1.0;
        assert!((DefaultTFIDFEngine::smooth_idf(4, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn rows_are_unit_length_and_skip_unknown_terms() {
        let vocabulary = vocab(&["alpha", "beta", "gamma"]);
        let idf = vec![1.0, 2.0, 1.0];
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["alpha", "beta", "beta", "unknown"]);

        let row: ZeroSpVec<f64> = DefaultTFIDFEngine::tf_idf_vec(&freq, &vocabulary, &idf);
        assert_eq!(row.len(), 3);
        assert_eq!(row.nnz(), 2);
        assert!((row.norm() - 1.0).abs() < 1e-12);
        // 正規化前の重みは 1 と 4
        assert!((row[1] / row[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_document_is_zero_row() {
        let vocabulary = vocab(&["alpha"]);
        let row: ZeroSpVec<f32> = DefaultTFIDFEngine::tf_idf_vec(&TokenFrequency::new(), &vocabulary, &[1.0]);
        assert_eq!(row.nnz(), 0);
        assert_eq!(row.len(), 1);
    }
}
