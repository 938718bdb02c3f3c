//! Visualization mapping module
//!
//! Turns centrality scores into node sizes and colors, normalizing each
//! metric within its own connected component, and writes the resulting view
//! for an external graph renderer.

use anyhow::Result;
use itertools::{Itertools, MinMaxResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::centrality::{CentralityScoreSet, NodeCentrality, Scores};
use crate::cluster::ConnectedComponent;
use crate::config::VisualConfig;
use crate::data::UserId;
use crate::graph::FriendGraph;

/// An RGB color, serialized as `rgb(r, g, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Visual attributes of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualAttributes {
    pub id: UserId,
    pub label: String,

    /// Hover text with the raw scores
    pub title: String,

    pub size: f64,
    pub color: Rgb,

    /// The three scores min-max normalized within the component
    pub normalized: NodeCentrality,

    /// Component the node belongs to
    pub group: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisualEdge {
    pub from: UserId,
    pub to: UserId,
}

/// Everything the renderer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<VisualAttributes>,
    pub edges: Vec<VisualEdge>,
}

/// Min-max normalizer over one metric within one component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    min: f64,
    max: f64,
    midpoint: f64,
}

impl Normalizer {
    /// Normalizer over `values`; missing scores count as 0
    pub fn over(members: &[UserId], scores: &Scores, midpoint: f64) -> Self {
        let values = members.iter().map(|id| scores.get(id).copied().unwrap_or(0.0));
        let (min, max) = match values.minmax() {
            MinMaxResult::NoElements => (0.0, 0.0),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        Self { min, max, midpoint }
    }

    /// `(v - min) / (max - min)`, or the midpoint when every value is equal
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else {
            self.midpoint
        }
    }
}

/// Maps per-component scores to visual attributes
pub struct VisualizationMapper {
    config: VisualConfig,
}

impl VisualizationMapper {
    pub fn new(config: VisualConfig) -> Self {
        Self { config }
    }

    /// Node size for a normalized betweenness
    pub fn size(&self, normalized_betweenness: f64) -> f64 {
        self.config.size_base + normalized_betweenness * self.config.size_scale
    }

    /// Red-to-blue gradient on normalized closeness; green stays 0
    pub fn color(&self, normalized_closeness: f64) -> Rgb {
        let c = normalized_closeness.clamp(0.0, 1.0);
        Rgb {
            r: (255.0 * c) as u8,
            g: 0,
            b: (255.0 * (1.0 - c)) as u8,
        }
    }

    /// Visual attributes of every member of `component`
    pub fn map(
        &self,
        component: &ConnectedComponent,
        scores: &CentralityScoreSet,
        graph: &FriendGraph,
    ) -> Vec<VisualAttributes> {
        let midpoint = self.config.midpoint;
        let betweenness = Normalizer::over(&component.members, &scores.betweenness, midpoint);
        let closeness = Normalizer::over(&component.members, &scores.closeness, midpoint);
        let eigenvector = Normalizer::over(&component.members, &scores.eigenvector, midpoint);

        component
            .members
            .iter()
            .map(|&id| {
                let node = scores.node(id);
                let label = graph
                    .person(id)
                    .map(|p| p.display_name())
                    .unwrap_or_else(|| format!("{id}"));
                let normalized = NodeCentrality {
                    betweenness: betweenness.normalize(node.betweenness),
                    closeness: closeness.normalize(node.closeness),
                    eigenvector: eigenvector.normalize(node.eigenvector),
                };

                VisualAttributes {
                    id,
                    label,
                    title: format!(
                        "Closeness: {:.4}\nBetweenness: {:.4}\nEigenvector: {:.4}",
                        node.closeness, node.betweenness, node.eigenvector
                    ),
                    size: self.size(normalized.betweenness),
                    color: self.color(normalized.closeness),
                    normalized,
                    group: component.id,
                }
            })
            .collect()
    }

    /// Map every component and collect the graph's edges
    pub fn build_view(
        &self,
        graph: &FriendGraph,
        components: &[ConnectedComponent],
        scores: &CentralityScoreSet,
    ) -> GraphView {
        let nodes = components
            .iter()
            .flat_map(|component| self.map(component, scores, graph))
            .collect();
        let edges = graph
            .edges()
            .map(|(from, to, _)| VisualEdge { from, to })
            .collect();

        GraphView { nodes, edges }
    }
}

/// Write the view as JSON under `<output_dir>/visualizations`
pub fn write_view(view: &GraphView, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let viz_dir = output_dir.as_ref().join("visualizations");
    fs::create_dir_all(&viz_dir)?;

    let path = viz_dir.join("graph_view.json");
    let file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(file, view)?;

    log::info!(
        "Wrote view with {} nodes and {} edges to {}",
        view.nodes.len(),
        view.edges.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: usize, members: Vec<UserId>) -> ConnectedComponent {
        ConnectedComponent {
            id,
            nodes: (0..members.len() as u32).collect(),
            members,
            edge_count: 0,
        }
    }

    fn scores(entries: &[(UserId, f64, f64)]) -> CentralityScoreSet {
        let mut set = CentralityScoreSet::default();
        for &(id, b, c) in entries {
            set.betweenness.insert(id, b);
            set.closeness.insert(id, c);
            set.eigenvector.insert(id, 0.5);
        }
        set
    }

    #[test]
    fn sizes_and_colors_span_the_component_range() {
        let mapper = VisualizationMapper::new(VisualConfig::default());
        let set = scores(&[(1, 0.0, 0.2), (2, 0.5, 0.6), (3, 1.0, 1.0)]);
        let view = mapper.map(&component(4, vec![1, 2, 3]), &set, &FriendGraph::new());

        assert_eq!(view[0].size, 10.0);
        assert_eq!(view[1].size, 30.0);
        assert_eq!(view[2].size, 50.0);
        assert_eq!(view[0].color, Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(view[1].color, Rgb { r: 127, g: 0, b: 127 });
        assert_eq!(view[2].color, Rgb { r: 255, g: 0, b: 0 });
        assert!(view.iter().all(|v| v.group == 4));
        assert_eq!(view[0].label, "1");
    }

    #[test]
    fn eigenvector_is_normalized_per_component() {
        let mapper = VisualizationMapper::new(VisualConfig::default());
        let mut set = scores(&[(1, 0.0, 0.0), (2, 0.0, 0.0), (3, 0.0, 0.0)]);
        set.eigenvector.insert(1, 0.2);
        set.eigenvector.insert(2, 0.4);
        set.eigenvector.insert(3, 0.6);
        let view = mapper.map(&component(0, vec![1, 2, 3]), &set, &FriendGraph::new());

        let normalized: Vec<f64> = view.iter().map(|v| v.normalized.eigenvector).collect();
        assert_eq!(normalized[0], 0.0);
        assert!((normalized[1] - 0.5).abs() < 1e-12);
        assert_eq!(normalized[2], 1.0);
        assert!(view.iter().all(|v| v.normalized.betweenness == 0.5));
    }

    #[test]
    fn singleton_component_uses_midpoint() {
        let mapper = VisualizationMapper::new(VisualConfig::default());
        let set = scores(&[(7, 0.0, 0.0)]);
        let view = mapper.map(&component(0, vec![7]), &set, &FriendGraph::new());

        assert_eq!(view[0].size, 30.0);
        assert_eq!(view[0].color, Rgb { r: 127, g: 0, b: 127 });
    }

    #[test]
    fn missing_scores_read_as_zero() {
        let normalizer = Normalizer::over(&[1, 2], &[(1, 4.0)].into_iter().collect(), 0.5);
        assert_eq!(normalizer.normalize(0.0), 0.0);
        assert_eq!(normalizer.normalize(4.0), 1.0);
    }

    #[test]
    fn color_serializes_as_css() {
        let json = serde_json::to_string(&Rgb { r: 255, g: 0, b: 3 }).unwrap();
        assert_eq!(json, "\"rgb(255, 0, 3)\"");
    }

    #[test]
    fn write_view_creates_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let view = GraphView {
            nodes: Vec::new(),
            edges: vec![VisualEdge { from: 1, to: 2 }],
        };
        let path = write_view(&view, dir.path()).unwrap();
        let written: serde_json::Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(written["edges"][0]["from"], 1);
    }
}
