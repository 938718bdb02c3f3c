//! Connected component analysis module

pub mod detection;
pub mod metrics;

pub use detection::partition;

use serde::{Deserialize, Serialize};

use crate::data::UserId;

/// A maximal set of mutually reachable nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedComponent {
    /// Position of this component in the partition
    pub id: usize,

    /// Members as node indices into the partitioned adjacency, in discovery order
    pub nodes: Vec<u32>,

    /// Members as user ids, parallel to `nodes`
    pub members: Vec<UserId>,

    /// Edges with both endpoints in the component
    pub edge_count: usize,
}

impl ConnectedComponent {
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.nodes.len() == 1
    }
}
