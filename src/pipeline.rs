//! End-to-end analysis: records → graph → components → centralities

use crate::centrality::{CentralityEngine, CentralityMode, CentralityOutcome};
use crate::cluster::{partition, ConnectedComponent};
use crate::config::Config;
use crate::data::RawRecords;
use crate::graph::builder::build_graph;
use crate::graph::{Adjacency, FriendGraph, StructuralWarning};
use crate::viz::{GraphView, VisualizationMapper};

/// Everything derived from one input snapshot
#[derive(Debug)]
pub struct Analysis {
    pub graph: FriendGraph,
    pub warnings: Vec<StructuralWarning>,
    pub adjacency: Adjacency,
    pub components: Vec<ConnectedComponent>,
    pub mode: CentralityMode,
    pub outcome: CentralityOutcome,
}

impl Analysis {
    /// Visual attributes for every node, normalized per component
    pub fn view(&self, config: &Config) -> GraphView {
        VisualizationMapper::new(config.visual).build_view(&self.graph, &self.components, &self.outcome.scores)
    }
}

/// Build the graph from raw records and analyze it
pub fn analyze(records: &RawRecords, config: &Config) -> Analysis {
    let report = build_graph(records, config.build);
    analyze_graph(report.graph, report.warnings, config)
}

/// Analyze an already built graph
pub fn analyze_graph(graph: FriendGraph, warnings: Vec<StructuralWarning>, config: &Config) -> Analysis {
    let adjacency = Adjacency::from_graph(&graph);
    log::debug!("Adjacency uses {} bytes", adjacency.memory_usage());

    let components = partition(&adjacency);

    let engine = CentralityEngine::new(config.centrality);
    let outcome = engine.compute_with_mode(&adjacency, &components);

    Analysis {
        graph,
        warnings,
        adjacency,
        components,
        mode: config.centrality.mode,
        outcome,
    }
}
