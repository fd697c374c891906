use serde::{Deserialize, Serialize};

use crate::paper::PaperMeta;
use crate::vectorizer::TFIDFVectorizer;

/// Row of `cluster_summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    /// Heaviest centroid terms joined with ", "
    pub top_terms: String,
    pub n_papers: usize,
    /// `None` for a cluster with no members
    pub avg_citations: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

/// Feature names of the `n` largest centroid weights, heaviest first.
/// Equal weights put the higher column first.
pub fn top_terms(center: &[f64], vectorizer: &TFIDFVectorizer, n: usize) -> Vec<String> {
    let mut order: Vec<usize> = (0..center.len()).collect();
    order.sort_by(|&a, &b| center[b].total_cmp(&center[a]).then(b.cmp(&a)));
    order
        .into_iter()
        .take(n)
        .filter_map(|col| vectorizer.feature_name(col).map(str::to_string))
        .collect()
}

/// One summary per cluster id in `0..centers.len()`, empty clusters included.
pub fn summarize(
    centers: &[Vec<f64>],
    labels: &[usize],
    metadata: &[PaperMeta],
    vectorizer: &TFIDFVectorizer,
    n_terms: usize,
) -> Vec<ClusterSummary> {
    let k = centers.len();
    let mut n_papers = vec![0_usize; k];
    let mut citations = vec![0_f64; k];
    let mut min_year: Vec<Option<i32>> = vec![None; k];
    let mut max_year: Vec<Option<i32>> = vec![None; k];

    for (&label, paper) in labels.iter().zip(metadata) {
        n_papers[label] += 1;
        citations[label] += paper.n_citation as f64;
        if let Some(year) = paper.year {
            min_year[label] = Some(min_year[label].map_or(year, |y| y.min(year)));
            max_year[label] = Some(max_year[label].map_or(year, |y| y.max(year)));
        }
    }

    centers
        .iter()
        .enumerate()
        .map(|(cluster, center)| ClusterSummary {
            cluster,
            top_terms: top_terms(center, vectorizer, n_terms).join(", "),
            n_papers: n_papers[cluster],
            avg_citations: (n_papers[cluster] > 0)
                .then(|| citations[cluster] / n_papers[cluster] as f64),
            min_year: min_year[cluster],
            max_year: max_year[cluster],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::build;
    use crate::paper::CorpusLoader;

    fn fixture() -> (TFIDFVectorizer, Vec<PaperMeta>) {
        let corpus = CorpusLoader::load_from_reader(
            "paper_id,title,abstract,year\n\
             p1,Alpha,Beta,2010\n\
             p2,Gamma,Delta,2012\n"
                .as_bytes(),
        )
        .unwrap();
        let (vectorizer, _) = build(&corpus, &IndexConfig::default());
        (vectorizer, corpus.metadata())
    }

    #[test]
    fn equal_weights_put_higher_column_first() {
        let (vectorizer, _) = fixture();
        let names = vectorizer.feature_names();
        let n = names.len();
        let mut center = vec![0.0; n];
        center[0] = 0.5;
        center[2] = 0.5;

        let terms = top_terms(&center, &vectorizer, 3);
        assert_eq!(terms, vec![names[2], names[0], names[n - 1]]);

        let zeros = top_terms(&vec![0.0; n], &vectorizer, 2);
        assert_eq!(zeros, vec![names[n - 1], names[n - 2]]);
    }

    #[test]
    fn huge_citation_counts_do_not_overflow() {
        let (vectorizer, mut metadata) = fixture();
        for paper in metadata.iter_mut() {
            paper.n_citation = u64::MAX;
        }
        let centers = vec![vec![0.0; vectorizer.vocab_size()]];
        let summaries = summarize(&centers, &[0, 0], &metadata, &vectorizer, 3);

        let avg = summaries[0].avg_citations.unwrap();
        assert!((avg - u64::MAX as f64).abs() / (u64::MAX as f64) < 1e-9);
        assert_eq!(summaries[0].n_papers, 2);
        assert_eq!((summaries[0].min_year, summaries[0].max_year), (Some(2010), Some(2012)));
    }
}
