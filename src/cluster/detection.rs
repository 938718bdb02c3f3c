//! Connected component detection

use std::collections::VecDeque;

use crate::cluster::ConnectedComponent;
use crate::graph::Adjacency;

/// Split the graph into connected components
///
/// Components are discovered by breadth-first traversal from the lowest
/// unassigned node, then ordered largest first. Ties keep discovery order, so
/// the ordering is stable for a given graph.
pub fn partition(graph: &Adjacency) -> Vec<ConnectedComponent> {
    log::info!("Finding connected components in graph with {} nodes", graph.node_count);

    let node_count = graph.node_count;
    let mut assigned = vec![false; node_count];
    let mut queue = VecDeque::new();
    let mut found: Vec<(Vec<u32>, usize)> = Vec::new();

    for start in 0..node_count {
        if assigned[start] {
            continue;
        }

        let mut nodes = Vec::new();
        let mut degree_sum = 0;
        assigned[start] = true;
        queue.push_back(start as u32);

        while let Some(node) = queue.pop_front() {
            nodes.push(node);
            let neighbors = graph.neighbors(node as usize);
            degree_sum += neighbors.len();
            for &next in neighbors {
                if !assigned[next as usize] {
                    assigned[next as usize] = true;
                    queue.push_back(next);
                }
            }
        }

        found.push((nodes, degree_sum / 2));
    }

    // Sort components by size (largest first); sort_by is stable
    found.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let components: Vec<ConnectedComponent> = found
        .into_iter()
        .enumerate()
        .map(|(id, (nodes, edge_count))| ConnectedComponent {
            id,
            members: nodes.iter().map(|&n| graph.ids[n as usize]).collect(),
            nodes,
            edge_count,
        })
        .collect();

    log::info!(
        "Found {} connected components ({} singletons)",
        components.len(),
        components.iter().filter(|c| c.is_singleton()).count()
    );

    components
}
