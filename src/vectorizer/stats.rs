use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::vectorizer::token::TokenFrequency;

/// Corpus-wide term statistics collected during fit.
///
/// Holds no document text, only:
/// - the number of documents
/// - per term, the number of documents containing it (for IDF)
/// - per term, the total occurrence count (for the `max_features` cut)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    pub doc_num: u64,
    pub doc_freq: HashMap<String, u64>,
    pub term_total: HashMap<String, u64>,
}

impl CorpusStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics over every document in parallel.
    pub fn from_frequencies(freqs: &[TokenFrequency]) -> Self {
        freqs
            .par_iter()
            .fold(CorpusStats::new, |mut stats, freq| {
                stats.add_doc(freq);
                stats
            })
            .reduce(CorpusStats::new, CorpusStats::merge)
    }

    /// Add one document's terms
    pub fn add_doc(&mut self, freq: &TokenFrequency) {
        self.doc_num += 1;
        for (term, count) in freq.iter() {
            match self.doc_freq.get_mut(term) {
                Some(df) => *df += 1,
                None => {
                    self.doc_freq.insert(term.to_string(), 1);
                }
            }
            *self.term_total.entry(term.to_string()).or_insert(0) += count as u64;
        }
    }

    /// Merge another partial result into self
    pub fn merge(mut self, other: CorpusStats) -> CorpusStats {
        self.doc_num += other.doc_num;
        for (term, df) in other.doc_freq {
            *self.doc_freq.entry(term).or_insert(0) += df;
        }
        for (term, total) in other.term_total {
            *self.term_total.entry(term).or_insert(0) += total;
        }
        self
    }

    #[inline]
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Number of documents containing `term`
    #[inline]
    pub fn get_doc_freq(&self, term: &str) -> u64 {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.doc_freq.len()
    }

    /// Vocabulary in alphabetical order.
    ///
    /// With `max_features > 0` and more terms than that, only the
    /// `max_features` terms with the highest total count survive; equal
    /// counts are decided alphabetically.
    pub fn select_vocabulary(&self, max_features: usize) -> Vec<String> {
        let mut terms: Vec<(&String, u64)> = self.term_total
            .iter()
            .map(|(term, &total)| (term, total))
            .collect();

        if max_features > 0 && terms.len() > max_features {
            terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            terms.truncate(max_features);
        }

        let mut vocab: Vec<String> = terms.into_iter().map(|(term, _)| term.clone()).collect();
        vocab.sort_unstable();
        vocab
    }
}
