//! Relative expression ranks of an experiment's vectors.
//!
//! A vector's rank is its 1-based position when the experiment's vectors
//! are sorted ascending by the statistic, divided by the number of vectors
//! with a defined statistic. Ties share the lowest position. NaN values are
//! ignored; an all-NaN vector has no rank.

use std::cmp::Ordering;

/// Ranks of one vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ranks {
    pub by_mean: Option<f64>,
    pub by_max: Option<f64>,
}

/// Compute ranks for every vector, in input order.
pub fn compute_ranks<V: AsRef<[f64]>>(vectors: &[V]) -> Vec<Ranks> {
    let means: Vec<Option<f64>> = vectors.iter().map(|v| mean(v.as_ref())).collect();
    let maxes: Vec<Option<f64>> = vectors.iter().map(|v| max(v.as_ref())).collect();
    let by_mean = relative_ranks(&means);
    let by_max = relative_ranks(&maxes);
    by_mean
        .into_iter()
        .zip(by_max)
        .map(|(by_mean, by_max)| Ranks { by_mean, by_max })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

fn relative_ranks(stats: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut order: Vec<(usize, f64)> = stats
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|s| (i, s)))
        .collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let defined = order.len() as f64;
    let mut ranks = vec![None; stats.len()];
    let mut position = 0usize;
    for (k, &(index, value)) in order.iter().enumerate() {
        if k == 0 || value != order[k - 1].1 {
            position = k + 1;
        }
        ranks[index] = Some(position as f64 / defined);
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_mean_and_max() {
        let vectors = vec![vec![1.0, 1.0], vec![0.0, 10.0], vec![3.0, 3.0]];
        let ranks = compute_ranks(&vectors);
        // means 1, 5, 3 ; maxes 1, 10, 3
        assert_eq!(ranks[0].by_mean, Some(1.0 / 3.0));
        assert_eq!(ranks[1].by_mean, Some(1.0));
        assert_eq!(ranks[2].by_mean, Some(2.0 / 3.0));
        assert_eq!(ranks[1].by_max, Some(1.0));
    }

    #[test]
    fn nan_is_ignored_and_all_nan_has_no_rank() {
        let vectors = vec![vec![f64::NAN, 4.0], vec![f64::NAN, f64::NAN], vec![2.0, 2.0]];
        let ranks = compute_ranks(&vectors);
        assert_eq!(ranks[0].by_mean, Some(1.0));
        assert_eq!(ranks[1], Ranks::default());
        assert_eq!(ranks[2].by_mean, Some(0.5));
    }

    #[test]
    fn ties_share_lowest_position() {
        let vectors = vec![vec![1.0], vec![2.0], vec![2.0], vec![3.0]];
        let ranks = compute_ranks(&vectors);
        assert_eq!(ranks[1].by_mean, Some(0.5));
        assert_eq!(ranks[2].by_mean, Some(0.5));
        assert_eq!(ranks[3].by_mean, Some(1.0));
    }

    #[test]
    fn empty_input() {
        assert!(compute_ranks::<Vec<f64>>(&[]).is_empty());
    }
}
