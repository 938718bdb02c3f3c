//! Compressed adjacency representation used by the graph algorithms

use std::mem;

use crate::data::UserId;
use crate::graph::FriendGraph;

/// Compressed sparse row view of an undirected graph
///
/// Every edge is stored in both endpoints' neighbor lists. Node `i` here is
/// node `i` of the source graph's insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjacency {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Offset array: index where each node's neighbors begin
    /// offsets[i] to offsets[i+1] defines the neighbor range for node i
    pub offsets: Vec<u32>,

    /// Concatenated, sorted neighbor lists
    pub targets: Vec<u32>,

    /// User id of each node
    pub ids: Vec<UserId>,
}

impl Adjacency {
    /// Create an empty adjacency with pre-allocated capacity
    pub fn with_capacity(node_count: usize, target_count: usize) -> Self {
        Self {
            node_count: 0,
            offsets: Vec::with_capacity(node_count + 1),
            targets: Vec::with_capacity(target_count),
            ids: Vec::with_capacity(node_count),
        }
    }

    /// Snapshot the structure of a friend graph
    pub fn from_graph(graph: &FriendGraph) -> Self {
        let inner = graph.inner();
        let node_count = inner.node_count();
        let mut adjacency = Self::with_capacity(node_count, inner.edge_count() * 2);

        adjacency.offsets.push(0);
        let mut offset = 0;
        for node in inner.node_indices() {
            let mut neighbors: Vec<u32> = inner.neighbors(node).map(|n| n.index() as u32).collect();
            neighbors.sort_unstable();
            offset += neighbors.len() as u32;
            adjacency.targets.extend_from_slice(&neighbors);
            adjacency.offsets.push(offset);
            adjacency.ids.push(inner[node].id);
        }
        adjacency.node_count = node_count;

        adjacency
    }

    /// Build from an explicit edge list over `ids`, ignoring self-loops and duplicates
    pub fn from_edges(ids: Vec<UserId>, edges: &[(u32, u32)]) -> Self {
        let node_count = ids.len();
        let mut lists: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        for &(a, b) in edges {
            if a == b || a as usize >= node_count || b as usize >= node_count {
                continue;
            }
            lists[a as usize].push(b);
            lists[b as usize].push(a);
        }

        let mut adjacency = Self::with_capacity(node_count, edges.len() * 2);
        adjacency.offsets.push(0);
        let mut offset = 0;
        for mut list in lists {
            list.sort_unstable();
            list.dedup();
            offset += list.len() as u32;
            adjacency.targets.extend_from_slice(&list);
            adjacency.offsets.push(offset);
        }
        adjacency.node_count = node_count;
        adjacency.ids = ids;

        adjacency
    }

    /// Neighbors of a node
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.targets[start..end]
    }

    pub fn degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Check if nodes `a` and `b` are adjacent
    pub fn has_edge(&self, a: usize, b: u32) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Extract the subgraph induced by `members`
    ///
    /// Node `i` of the result is `members[i]` of this graph.
    pub fn induced(&self, members: &[u32]) -> Adjacency {
        let mut orig_to_sub = vec![u32::MAX; self.node_count];
        for (i, &node) in members.iter().enumerate() {
            orig_to_sub[node as usize] = i as u32;
        }

        let mut subgraph = Adjacency::with_capacity(members.len(), 0);
        subgraph.offsets.push(0);
        let mut offset = 0;

        for &node in members {
            let mut list: Vec<u32> = self
                .neighbors(node as usize)
                .iter()
                .map(|&target| orig_to_sub[target as usize])
                // Only include edges where both endpoints are in the subgraph
                .filter(|&sub| sub != u32::MAX)
                .collect();
            list.sort_unstable();
            offset += list.len() as u32;
            subgraph.targets.extend_from_slice(&list);
            subgraph.offsets.push(offset);
            subgraph.ids.push(self.ids[node as usize]);
        }
        subgraph.node_count = members.len();

        subgraph
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        mem::size_of::<Self>()
            + self.offsets.capacity() * mem::size_of::<u32>()
            + self.targets.capacity() * mem::size_of::<u32>()
            + self.ids.capacity() * mem::size_of::<UserId>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_edges_symmetrizes_and_dedups() {
        let adj = Adjacency::from_edges(vec![10, 20, 30], &[(0, 1), (1, 0), (1, 2), (2, 2)]);
        assert_eq!(adj.neighbors(0), &[1]);
        assert_eq!(adj.neighbors(1), &[0, 2]);
        assert_eq!(adj.neighbors(2), &[1]);
        assert_eq!(adj.edge_count(), 2);
        assert!(adj.has_edge(2, 1));
        assert!(!adj.has_edge(0, 2));
    }

    #[test]
    fn induced_subgraph_remaps_indices() {
        // 0-1-2-3 path, take {1, 3, 2}
        let adj = Adjacency::from_edges(vec![10, 11, 12, 13], &[(0, 1), (1, 2), (2, 3)]);
        let sub = adj.induced(&[1, 3, 2]);

        assert_eq!(sub.ids, vec![11, 13, 12]);
        assert_eq!(sub.neighbors(0), &[2]);
        assert_eq!(sub.neighbors(1), &[2]);
        assert_eq!(sub.neighbors(2), &[0, 1]);
        assert_eq!(sub.edge_count(), 2);
    }

    #[test]
    fn from_graph_follows_insertion_order() {
        let mut graph = FriendGraph::new();
        graph.upsert(42);
        graph.upsert(7);
        graph.upsert(9);
        graph.connect(42, 9);
        graph.connect(7, 9);

        let adj = Adjacency::from_graph(&graph);
        assert_eq!(adj.ids, vec![42, 7, 9]);
        assert_eq!(adj.neighbors(2), &[0, 1]);
        assert_eq!(adj.degree(0), 1);
        assert!(adj.memory_usage() > 0);
    }
}
