//! Adaptive quantile bins.

use super::{format_edge, DistanceBin};

/// Number of quantile bins to request for a sample.
///
/// Returns `target` unless the sample has few distinct values: a single
/// distinct value gives one bin, and when there are at most `2 * target`
/// distinct values the count becomes the number of distinct nearest-rank
/// cut points at `target` evenly spaced probabilities, shrunk by `shrink`.
pub fn quantile_bin_count(values: &[f64], target: usize, shrink: f64) -> usize {
    let target = target.max(1);
    let sorted = sorted_values(values);
    if sorted.is_empty() {
        return 0;
    }
    let mut distinct = sorted.clone();
    distinct.dedup();

    if distinct.len() == 1 {
        return 1;
    }

    if distinct.len() <= 2 * target {
        let mut cuts: Vec<f64> = (0..target)
            .map(|i| nearest_rank(&sorted, i as f64 / target as f64))
            .collect();
        cuts.dedup();
        let shrunk = (cuts.len() as f64 * shrink).floor() as usize;
        return shrunk.max(1);
    }

    target
}

/// Equal-population bins over a sample, with duplicate edges dropped.
#[derive(Debug, Clone)]
pub struct QuantileBins {
    edges: Vec<f64>,
    bins: Vec<DistanceBin>,
}

impl QuantileBins {
    /// Build bins for `values` using [`quantile_bin_count`] to pick the count.
    pub fn fit(values: &[f64], target: usize, shrink: f64) -> Self {
        let count = quantile_bin_count(values, target, shrink);
        Self::with_count(values, count)
    }

    /// Cut `values` at `count + 1` linearly interpolated quantiles.
    pub fn with_count(values: &[f64], count: usize) -> Self {
        let sorted = sorted_values(values);
        if sorted.is_empty() || count == 0 {
            return Self {
                edges: Vec::new(),
                bins: Vec::new(),
            };
        }

        let mut edges: Vec<f64> = (0..=count)
            .map(|i| linear_quantile(&sorted, i as f64 / count as f64))
            .collect();
        edges.dedup();

        // All values identical: one degenerate bin holding everything.
        if edges.len() == 1 {
            edges.push(edges[0]);
        }

        let bins = edges
            .windows(2)
            .map(|w| DistanceBin {
                lower: w[0],
                upper: w[1],
                label: format!("({} to {}]", format_edge(w[0]), format_edge(w[1])),
            })
            .collect();

        Self { edges, bins }
    }

    pub fn bins(&self) -> &[DistanceBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin index of `x`. Values outside the fitted range go to the nearest end bin.
    pub fn index_of(&self, x: f64) -> Option<usize> {
        if self.bins.is_empty() {
            return None;
        }
        let upper_edges = &self.edges[1..];
        let idx = upper_edges.partition_point(|e| *e < x);
        Some(idx.min(self.bins.len() - 1))
    }

    pub fn assign(&self, values: &[f64]) -> Vec<usize> {
        values
            .iter()
            .filter_map(|v| self.index_of(*v))
            .collect()
    }
}

fn sorted_values(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Nearest-rank quantile with ties rounded to even.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = p * (sorted.len() - 1) as f64;
    let idx = (h.round_ties_even() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Linearly interpolated quantile.
fn linear_quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = p * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
