//! Graph representation and construction module

pub mod builder;
pub mod compressed;

pub use builder::{BuildReport, GraphBuilder, StructuralWarning};
pub use compressed::Adjacency;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::data::UserId;

/// Where a node's current name attributes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameSource {
    /// The user's own top-level record
    TopLevel,
    /// A friend reference nested under another user
    Nested,
}

/// A user node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// Number of times the id occurred in the records and friend lists the
    /// builder expanded
    pub appearances: u32,

    pub name_source: Option<NameSource>,
}

impl Person {
    fn new(id: UserId) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            appearances: 0,
            name_source: None,
        }
    }

    /// "First Last", with "Unknown" standing in for a missing part
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or("Unknown"),
            self.last_name.as_deref().unwrap_or("Unknown")
        )
    }
}

/// A friendship edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Number of times the pair was listed in the friend lists the builder
    /// expanded; a nested list skipped as already expanded is not counted
    pub observations: u32,
}

/// Undirected, simple friendship graph keyed by user id
///
/// Nodes keep insertion order, which is what every downstream index-based
/// structure inherits.
#[derive(Debug, Clone, Default)]
pub struct FriendGraph {
    graph: UnGraph<Person, Link>,
    index: HashMap<UserId, NodeIndex>,
}

impl FriendGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn person(&self, id: UserId) -> Option<&Person> {
        self.index.get(&id).map(|&idx| &self.graph[idx])
    }

    /// People in insertion order
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.graph.raw_nodes().iter().map(|n| &n.weight)
    }

    /// Edges as (id, id, link) in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (UserId, UserId, &Link)> {
        self.graph.raw_edges().iter().map(|e| {
            (
                self.graph[e.source()].id,
                self.graph[e.target()].id,
                &e.weight,
            )
        })
    }

    /// Edge set with each pair ordered (smaller id first)
    pub fn edge_set(&self) -> BTreeSet<(UserId, UserId)> {
        self.edges()
            .map(|(a, b, _)| if a <= b { (a, b) } else { (b, a) })
            .collect()
    }

    pub fn node_set(&self) -> BTreeSet<UserId> {
        self.index.keys().copied().collect()
    }

    pub fn has_edge(&self, a: UserId, b: UserId) -> bool {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    pub fn link(&self, a: UserId, b: UserId) -> Option<&Link> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        self.graph
            .find_edge(ia, ib)
            .and_then(|e| self.graph.edge_weight(e))
    }

    pub(crate) fn inner(&self) -> &UnGraph<Person, Link> {
        &self.graph
    }

    /// Get or create the node for `id`
    pub(crate) fn upsert(&mut self, id: UserId) -> &mut Person {
        let idx = match self.index.get(&id) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(Person::new(id));
                self.index.insert(id, idx);
                idx
            }
        };
        &mut self.graph[idx]
    }

    /// Record an observation of the pair, adding the edge on first sight
    ///
    /// Returns true when the edge is new. Both endpoints must already exist.
    pub(crate) fn connect(&mut self, a: UserId, b: UserId) -> bool {
        let (Some(&ia), Some(&ib)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };
        if ia == ib {
            return false;
        }

        match self.graph.find_edge(ia, ib) {
            Some(edge) => {
                self.graph[edge].observations += 1;
                false
            }
            None => {
                self.graph.add_edge(ia, ib, Link { observations: 1 });
                true
            }
        }
    }

    fn set_link(&mut self, a: UserId, b: UserId, link: Link) {
        if let (Some(&ia), Some(&ib)) = (self.index.get(&a), self.index.get(&b)) {
            if let Some(edge) = self.graph.find_edge(ia, ib) {
                self.graph[edge] = link;
            }
        }
    }

    /// Serializable form of the graph
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            people: self.people().cloned().collect(),
            edges: self
                .graph
                .raw_edges()
                .iter()
                .map(|e| (e.source().index() as u32, e.target().index() as u32, e.weight))
                .collect(),
        }
    }

    /// Rebuild a graph from a snapshot, dropping edges with dangling endpoints
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = Self::new();
        let mut ids = Vec::with_capacity(snapshot.people.len());

        for person in snapshot.people {
            let id = person.id;
            ids.push(id);
            *graph.upsert(id) = person;
        }

        for (a, b, link) in snapshot.edges {
            let (Some(&a), Some(&b)) = (ids.get(a as usize), ids.get(b as usize)) else {
                log::warn!("Snapshot edge ({}, {}) references a missing node", a, b);
                continue;
            };
            graph.connect(a, b);
            graph.set_link(a, b, link);
        }

        graph
    }
}

/// Flat, serializable copy of a [`FriendGraph`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub people: Vec<Person>,

    /// (source position, target position, link) into `people`
    pub edges: Vec<(u32, u32, Link)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in [1, 2, 3] {
            graph.upsert(id).appearances += 1;
        }
        graph.connect(1, 2);
        graph.connect(2, 3);
        graph.connect(3, 1);
        graph
    }

    #[test]
    fn connect_is_idempotent() {
        let mut graph = triangle();
        assert!(!graph.connect(2, 1));
        assert!(!graph.connect(1, 2));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.link(1, 2).unwrap().observations, 3);
    }

    #[test]
    fn self_loops_are_rejected() {
        let mut graph = triangle();
        assert!(!graph.connect(1, 1));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn display_name_falls_back_to_unknown() {
        let mut person = Person::new(5);
        person.first_name = Some("Ann".into());
        assert_eq!(person.display_name(), "Ann Unknown");
    }

    #[test]
    fn snapshot_preserves_nodes_and_edges() {
        let mut graph = triangle();
        graph.connect(1, 2);
        graph.upsert(4).first_name = Some("Solo".into());

        let restored = FriendGraph::from_snapshot(graph.to_snapshot());
        assert_eq!(restored.node_set(), graph.node_set());
        assert_eq!(restored.edge_set(), graph.edge_set());
        assert_eq!(restored.link(1, 2).unwrap().observations, 2);
        assert_eq!(restored.person(4).unwrap().first_name.as_deref(), Some("Solo"));
    }
}
