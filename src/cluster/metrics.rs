//! Component statistics and metrics

use std::cmp::Ordering;

use crate::centrality::Scores;
use crate::cluster::ConnectedComponent;
use crate::data::UserId;

/// Density (actual edges / potential edges) of an undirected component
pub fn density(component: &ConnectedComponent) -> f64 {
    let n = component.size();
    if n <= 1 {
        return 1.0; // By convention, singleton components have density 1
    }

    let potential_edges = n * (n - 1) / 2;
    component.edge_count as f64 / potential_edges as f64
}

/// The `limit` highest-scoring members of a component, best first
///
/// Members without a score are left out. Ties keep member order.
pub fn top_members(component: &ConnectedComponent, scores: &Scores, limit: usize) -> Vec<(UserId, f64)> {
    let mut ranked: Vec<(UserId, f64)> = component
        .members
        .iter()
        .filter_map(|id| scores.get(id).map(|&score| (*id, score)))
        .collect();

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(members: Vec<UserId>, edge_count: usize) -> ConnectedComponent {
        ConnectedComponent {
            id: 0,
            nodes: (0..members.len() as u32).collect(),
            members,
            edge_count,
        }
    }

    #[test]
    fn triangle_is_fully_dense() {
        assert_eq!(density(&component(vec![1, 2, 3], 3)), 1.0);
        assert_eq!(density(&component(vec![1, 2, 3, 4], 3)), 0.5);
        assert_eq!(density(&component(vec![1], 0)), 1.0);
    }

    #[test]
    fn top_members_ranks_by_score() {
        let scores: Scores = [(1, 0.2), (2, 0.9), (3, 0.2), (4, 0.5)].into_iter().collect();
        let top = top_members(&component(vec![1, 2, 3, 4, 5], 4), &scores, 3);
        assert_eq!(top, vec![(2, 0.9), (4, 0.5), (1, 0.2)]);
    }
}
