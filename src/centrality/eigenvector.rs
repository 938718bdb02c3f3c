//! Eigenvector centrality via power iteration.
//!
//! Iterates `x <- (A + I) x` from the uniform vector, normalizing to unit L2
//! norm after each step. The identity shift leaves the dominant eigenvector
//! unchanged and keeps bipartite graphs (paths, stars, even cycles) from
//! oscillating between two vectors.
//!
//! Converged when the L1 change between steps drops below `n * tolerance`.

use crate::error::{Error, Result};
use crate::graph::Adjacency;

/// Compute eigenvector centrality, indexed by node
///
/// Returns [`Error::Convergence`] when `max_iter` steps pass without reaching
/// the tolerance.
pub fn eigenvector_centrality(graph: &Adjacency, max_iter: usize, tolerance: f64) -> Result<Vec<f64>> {
    let n = graph.node_count;
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut x = vec![1.0 / n as f64; n];
    let threshold = n as f64 * tolerance;

    for iteration in 0..max_iter {
        let last = x.clone();

        for (v, score) in x.iter_mut().enumerate() {
            *score += graph.neighbors(v).iter().map(|&u| last[u as usize]).sum::<f64>();
        }

        let norm = x.iter().map(|value| value * value).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for value in x.iter_mut() {
            *value /= norm;
        }

        let change: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if change < threshold {
            log::debug!("Eigenvector converged after {} iterations", iteration + 1);
            return Ok(x);
        }
    }

    Err(Error::Convergence {
        iterations: max_iter,
        tolerance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_returns_empty() {
        let adj = Adjacency::from_edges(Vec::new(), &[]);
        assert!(eigenvector_centrality(&adj, 100, 1e-6).unwrap().is_empty());
    }

    #[test]
    fn pair_converges_to_equal_scores() {
        let adj = Adjacency::from_edges(vec![1, 2], &[(0, 1)]);
        let ev = eigenvector_centrality(&adj, 10_000, 1e-6).unwrap();
        assert!((ev[0] - ev[1]).abs() < 1e-12);
        assert!((ev[0] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn single_node_scores_one() {
        let adj = Adjacency::from_edges(vec![9], &[]);
        let ev = eigenvector_centrality(&adj, 100, 1e-6).unwrap();
        assert!((ev[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn star_center_ranks_highest() {
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3], &[(0, 1), (0, 2), (0, 3)]);
        let ev = eigenvector_centrality(&adj, 10_000, 1e-6).unwrap();
        assert!(ev[0] > ev[1]);
        assert!((ev[1] - ev[2]).abs() < 1e-6);
        assert!((ev[2] - ev[3]).abs() < 1e-6);
        // Dominant eigenvector of a 3-star: center sqrt(3) times each leaf
        assert!((ev[0] / ev[1] - 3f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn path_middle_outranks_ends() {
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3, 4], &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let ev = eigenvector_centrality(&adj, 10_000, 1e-6).unwrap();
        assert!(ev[2] > ev[1] && ev[1] > ev[0]);
        assert!((ev[0] - ev[4]).abs() < 1e-6);
    }

    #[test]
    fn scores_are_non_negative() {
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3], &[(0, 1), (1, 2), (0, 2), (2, 3)]);
        let ev = eigenvector_centrality(&adj, 10_000, 1e-6).unwrap();
        assert!(ev.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn iteration_bound_reports_convergence_error() {
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3, 4], &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let err = eigenvector_centrality(&adj, 2, 1e-12).unwrap_err();
        assert!(matches!(err, Error::Convergence { iterations: 2, .. }));
    }
}
