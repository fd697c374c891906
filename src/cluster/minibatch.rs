use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::cluster::ClusterError;
use crate::config::ClusterConfig;
use crate::utils::math::vector::ZeroSpVec;

/// Mini-batch k-means over sparse rows with dense centres.
///
/// Seeding is k-means++ on a random sample, repeated `n_init` times; the
/// seeding with the lowest sample inertia is refined with mini-batch steps.
/// Every random draw comes from one `StdRng` seeded with `seed`, so equal
/// input and config give equal labels.
#[derive(Debug, Clone)]
pub struct MiniBatchKMeans {
    pub n_clusters: usize,
    pub batch_size: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub max_no_improvement: usize,
    pub seed: u64,
}

/// Fitted model.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centers: Vec<Vec<f64>>,
    /// Nearest centre of every row, ties to the lowest index
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centres
    pub inertia: f64,
    /// Mini-batch steps actually run
    pub n_steps: usize,
}

/// Centre plus cached squared norm.
struct Centers {
    dense: Vec<Vec<f64>>,
    norms_sq: Vec<f64>,
}

impl Centers {
    fn new(dense: Vec<Vec<f64>>) -> Self {
        let norms_sq = dense.iter().map(|c| c.iter().map(|v| v * v).sum()).collect();
        Self { dense, norms_sq }
    }

    fn refresh_norm(&mut self, j: usize) {
        self.norms_sq[j] = self.dense[j].iter().map(|v| v * v).sum();
    }

    /// (label, squared distance) of the closest centre.
    #[inline]
    fn nearest(&self, row: &ZeroSpVec<f32>, row_norm_sq: f64) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for (j, center) in self.dense.iter().enumerate() {
            let dist = (row_norm_sq - 2.0 * row.dot_dense(center) + self.norms_sq[j]).max(0.0);
            if dist < best.1 {
                best = (j, dist);
            }
        }
        best
    }
}

impl From<&ClusterConfig> for MiniBatchKMeans {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            n_clusters: config.n_clusters,
            batch_size: config.batch_size.max(1),
            n_init: config.n_init.max(1),
            max_iter: config.max_iter.max(1),
            max_no_improvement: config.max_no_improvement,
            seed: config.seed,
        }
    }
}

impl MiniBatchKMeans {
    pub fn fit(&self, rows: &[ZeroSpVec<f32>]) -> Result<KMeansFit, ClusterError> {
        let n = rows.len();
        let k = self.n_clusters;
        if k == 0 || k > n {
            return Err(ClusterError::InvalidClusterCount { requested: k, documents: n });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let row_norms: Vec<f64> = rows.par_iter().map(|r| r.norm_sq()).collect();

        // seeding sample
        let init_size = (3 * self.batch_size).max(3 * k).min(n);
        let init_idx: Vec<usize> = sample(&mut rng, n, init_size).into_vec();

        let mut centers = self.kmeans_plusplus(rows, &row_norms, &init_idx, &mut rng);
        let mut best_inertia = inertia_of(rows, &row_norms, &init_idx, &centers);
        for run in 1..self.n_init {
            let candidate = self.kmeans_plusplus(rows, &row_norms, &init_idx, &mut rng);
            let inertia = inertia_of(rows, &row_norms, &init_idx, &candidate);
            tracing::debug!(run, inertia, "k-means++ seeding");
            if inertia < best_inertia {
                centers = candidate;
                best_inertia = inertia;
            }
        }

        let n_steps = self.refine(rows, &row_norms, &mut centers, &mut rng);

        let assigned: Vec<(usize, f64)> = rows
            .par_iter()
            .zip(row_norms.par_iter())
            .map(|(row, &norm_sq)| centers.nearest(row, norm_sq))
            .collect();
        let inertia: f64 = assigned.iter().map(|(_, d)| d).sum();
        let labels = assigned.into_iter().map(|(label, _)| label).collect();

        Ok(KMeansFit {
            centers: centers.dense,
            labels,
            inertia,
            n_steps,
        })
    }

    /// k-means++ with greedy local trials over the `sample` rows.
    fn kmeans_plusplus(
        &self,
        rows: &[ZeroSpVec<f32>],
        row_norms: &[f64],
        sample: &[usize],
        rng: &mut StdRng,
    ) -> Centers {
        let k = self.n_clusters;
        let n_local_trials = 2 + (k as f64).ln().floor() as usize;
        let sq_dist = |a: usize, b: usize| {
            (row_norms[a] + row_norms[b] - 2.0 * rows[a].dot(&rows[b])).max(0.0)
        };

        let first = sample[rng.gen_range(0..sample.len())];
        let mut chosen = vec![first];
        let mut closest: Vec<f64> = sample.iter().map(|&i| sq_dist(i, first)).collect();
        let mut potential: f64 = closest.iter().sum();

        while chosen.len() < k {
            let mut best_candidate: Option<(usize, f64, Vec<f64>)> = None;
            for _ in 0..n_local_trials {
                let pos = if potential > 0.0 {
                    weighted_pick(&closest, rng.gen::<f64>() * potential)
                } else {
                    // every sample point already sits on a centre
                    rng.gen_range(0..sample.len())
                };
                let candidate = sample[pos];
                let dists: Vec<f64> = sample
                    .par_iter()
                    .zip(closest.par_iter())
                    .map(|(&i, &c)| sq_dist(i, candidate).min(c))
                    .collect();
                let pot: f64 = dists.iter().sum();
                if best_candidate.as_ref().map_or(true, |(_, p, _)| pot < *p) {
                    best_candidate = Some((candidate, pot, dists));
                }
            }
            if let Some((candidate, pot, dists)) = best_candidate {
                chosen.push(candidate);
                potential = pot;
                closest = dists;
            }
        }

        Centers::new(
            chosen
                .into_iter()
                .map(|i| rows[i].to_dense().into_iter().map(f64::from).collect())
                .collect(),
        )
    }

    /// Mini-batch refinement. Returns the number of steps run.
    fn refine(
        &self,
        rows: &[ZeroSpVec<f32>],
        row_norms: &[f64],
        centers: &mut Centers,
        rng: &mut StdRng,
    ) -> usize {
        let n = rows.len();
        let batch_size = self.batch_size.min(n);
        let n_steps = ((self.max_iter * n) / batch_size).max(1);
        let alpha = (batch_size as f64 * 2.0 / (n as f64 + 1.0)).min(1.0);

        let mut counts = vec![0_f64; self.n_clusters];
        let mut ewa_inertia: Option<f64> = None;
        let mut ewa_inertia_min = f64::INFINITY;
        let mut no_improvement = 0;

        for step in 0..n_steps {
            let batch: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..n)).collect();
            let assigned: Vec<(usize, f64)> = batch
                .par_iter()
                .map(|&i| centers.nearest(&rows[i], row_norms[i]))
                .collect();
            let batch_inertia = assigned.iter().map(|(_, d)| d).sum::<f64>() / batch_size as f64;

            let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.n_clusters];
            for (&i, &(label, _)) in batch.iter().zip(assigned.iter()) {
                members[label].push(i);
            }
            // 各サンプルの学習率 1/count をまとめて適用
            // center = (center * old + Σx) / (old + m)
            for (j, member_rows) in members.iter().enumerate() {
                if member_rows.is_empty() {
                    continue;
                }
                let old = counts[j];
                let new = old + member_rows.len() as f64;
                let center = &mut centers.dense[j];
                let scale = old / new;
                for v in center.iter_mut() {
                    *v *= scale;
                }
                for &i in member_rows {
                    for (col, val) in rows[i].raw_iter() {
                        center[col] += *val as f64 / new;
                    }
                }
                counts[j] = new;
                centers.refresh_norm(j);
            }

            // first step has no smoothed history yet
            let ewa = match ewa_inertia {
                None => batch_inertia,
                Some(prev) => prev * (1.0 - alpha) + batch_inertia * alpha,
            };
            ewa_inertia = Some(ewa);
            if step == 0 {
                continue;
            }
            if ewa < ewa_inertia_min {
                ewa_inertia_min = ewa;
                no_improvement = 0;
            } else {
                no_improvement += 1;
            }
            if self.max_no_improvement > 0 && no_improvement >= self.max_no_improvement {
                tracing::debug!(step, ewa, "mini-batch k-means converged");
                return step + 1;
            }
        }
        n_steps
    }
}

/// Index of the first cumulative weight exceeding `target`.
fn weighted_pick(weights: &[f64], target: f64) -> usize {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if acc > target {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

fn inertia_of(rows: &[ZeroSpVec<f32>], row_norms: &[f64], idx: &[usize], centers: &Centers) -> f64 {
    let dists: Vec<f64> = idx
        .par_iter()
        .map(|&i| centers.nearest(&rows[i], row_norms[i]).1)
        .collect();
    dists.iter().sum()
}
