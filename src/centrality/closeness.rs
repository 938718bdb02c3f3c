//! Closeness centrality

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::graph::Adjacency;

/// Compute closeness centrality, indexed by node
///
/// For a node reaching `r` nodes (itself included) at total distance `d`, the
/// score is `(r - 1) / d` scaled by `(r - 1) / (n - 1)`, so nodes in small
/// components are not rated as central as nodes reaching most of the graph.
/// Isolated nodes score 0.
pub fn closeness_centrality(graph: &Adjacency) -> Vec<f64> {
    let n = graph.node_count;
    if n == 0 {
        return Vec::new();
    }

    (0..n)
        .into_par_iter()
        .map_init(
            || (vec![u32::MAX; n], VecDeque::<u32>::new(), Vec::<u32>::new()),
            |(dist, queue, touched), source| {
                let (reached, total) = bfs_distances(graph, source, dist, queue, touched);
                if total == 0 || n == 1 {
                    return 0.0;
                }
                let reach = (reached - 1) as f64;
                (reach / total as f64) * (reach / (n - 1) as f64)
            },
        )
        .collect()
}

/// BFS from `source`; returns (nodes reached, sum of distances)
fn bfs_distances(
    graph: &Adjacency,
    source: usize,
    dist: &mut [u32],
    queue: &mut VecDeque<u32>,
    touched: &mut Vec<u32>,
) -> (usize, u64) {
    for &v in touched.iter() {
        dist[v as usize] = u32::MAX;
    }
    touched.clear();
    queue.clear();

    dist[source] = 0;
    touched.push(source as u32);
    queue.push_back(source as u32);

    let mut total: u64 = 0;
    while let Some(v) = queue.pop_front() {
        let next = dist[v as usize] + 1;
        for &w in graph.neighbors(v as usize) {
            if dist[w as usize] == u32::MAX {
                dist[w as usize] = next;
                total += u64::from(next);
                touched.push(w);
                queue.push_back(w);
            }
        }
    }

    (touched.len(), total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn pair_scores_one() {
        let adj = Adjacency::from_edges(vec![1, 2], &[(0, 1)]);
        let cc = closeness_centrality(&adj);
        assert!(close(cc[0], 1.0));
        assert!(close(cc[1], 1.0));
    }

    #[test]
    fn path_of_five() {
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3, 4], &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let cc = closeness_centrality(&adj);
        assert!(close(cc[0], 4.0 / 10.0));
        assert!(close(cc[1], 4.0 / 7.0));
        assert!(close(cc[2], 4.0 / 6.0));
        assert!(close(cc[3], cc[1]));
    }

    #[test]
    fn disconnected_graph_scales_by_reach() {
        // Pair plus an isolated node: each pair member reaches 1 of 2 others
        let adj = Adjacency::from_edges(vec![1, 2, 3], &[(0, 1)]);
        let cc = closeness_centrality(&adj);
        assert!(close(cc[0], 0.5));
        assert!(close(cc[1], 0.5));
        assert!(close(cc[2], 0.0));
    }

    #[test]
    fn single_node_is_zero() {
        let adj = Adjacency::from_edges(vec![1], &[]);
        assert_eq!(closeness_centrality(&adj), vec![0.0]);
    }
}
