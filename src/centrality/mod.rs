//! Centrality metrics for the friend graph
//!
//! Three independent analyses share read-only access to one [`Adjacency`]:
//!
//! - **Betweenness** (`betweenness`): fraction of shortest paths between
//!   other pairs that pass through a node.
//! - **Closeness** (`closeness`): inverse average distance to reachable
//!   nodes, scaled by reach.
//! - **Eigenvector** (`eigenvector`): principal eigenvector of the adjacency
//!   matrix by power iteration.
//!
//! [`CentralityEngine`] runs the three concurrently on large graphs and joins
//! all of them before returning. A failed metric is reported in
//! [`CentralityOutcome::failures`]; the others are still returned.

pub mod betweenness;
pub mod closeness;
pub mod eigenvector;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::ConnectedComponent;
use crate::config::CentralityConfig;
use crate::data::UserId;
use crate::error::{Error, Result};
use crate::graph::Adjacency;

/// Scores keyed by user id
pub type Scores = BTreeMap<UserId, f64>;

/// Which graph the metrics are computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CentralityMode {
    /// Once over the whole graph
    Global,
    /// Once per connected component, each treated as its own graph
    #[default]
    PerComponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Betweenness,
    Closeness,
    Eigenvector,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Betweenness => "betweenness",
            Metric::Closeness => "closeness",
            Metric::Eigenvector => "eigenvector",
        };
        f.write_str(name)
    }
}

/// The three scores of one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCentrality {
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: f64,
}

/// Per-node scores for all three metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentralityScoreSet {
    pub betweenness: Scores,
    pub closeness: Scores,
    pub eigenvector: Scores,
}

impl CentralityScoreSet {
    pub fn scores(&self, metric: Metric) -> &Scores {
        match metric {
            Metric::Betweenness => &self.betweenness,
            Metric::Closeness => &self.closeness,
            Metric::Eigenvector => &self.eigenvector,
        }
    }

    fn scores_mut(&mut self, metric: Metric) -> &mut Scores {
        match metric {
            Metric::Betweenness => &mut self.betweenness,
            Metric::Closeness => &mut self.closeness,
            Metric::Eigenvector => &mut self.eigenvector,
        }
    }

    /// Scores of one node; a metric with no score for it reads as 0
    pub fn node(&self, id: UserId) -> NodeCentrality {
        NodeCentrality {
            betweenness: self.betweenness.get(&id).copied().unwrap_or(0.0),
            closeness: self.closeness.get(&id).copied().unwrap_or(0.0),
            eigenvector: self.eigenvector.get(&id).copied().unwrap_or(0.0),
        }
    }

    /// Scores of the given ids only
    ///
    /// Ids missing from the graph are reported with zero scores.
    pub fn restrict(&self, ids: &[UserId]) -> BTreeMap<UserId, NodeCentrality> {
        ids.iter()
            .map(|&id| {
                if !self.betweenness.contains_key(&id)
                    && !self.closeness.contains_key(&id)
                    && !self.eigenvector.contains_key(&id)
                {
                    log::warn!("User {} of interest has no centrality scores", id);
                }
                (id, self.node(id))
            })
            .collect()
    }

    /// Scores of every node
    pub fn all(&self) -> BTreeMap<UserId, NodeCentrality> {
        let mut ids: Vec<UserId> = self.betweenness.keys().copied().collect();
        ids.extend(self.closeness.keys());
        ids.extend(self.eigenvector.keys());
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().map(|id| (id, self.node(id))).collect()
    }
}

/// A metric that could not be computed
#[derive(Debug)]
pub struct MetricFailure {
    pub metric: Metric,

    /// Component the failure happened in, when computing per component
    pub component: Option<usize>,

    pub error: Error,
}

impl fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(component) => write!(f, "{} (component {}): {}", self.metric, component, self.error),
            None => write!(f, "{}: {}", self.metric, self.error),
        }
    }
}

/// Joined result of one engine run
#[derive(Debug, Default)]
pub struct CentralityOutcome {
    pub scores: CentralityScoreSet,
    pub failures: Vec<MetricFailure>,
}

impl CentralityOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, metric: Metric) -> bool {
        self.failures.iter().any(|f| f.metric == metric)
    }

    /// All scores, or the first failure
    pub fn into_result(mut self) -> Result<CentralityScoreSet> {
        if self.failures.is_empty() {
            Ok(self.scores)
        } else {
            Err(self.failures.swap_remove(0).error)
        }
    }

    fn record(&mut self, graph: &Adjacency, metric: Metric, component: Option<usize>, result: Result<Vec<f64>>) {
        match result {
            Ok(values) => {
                let scores = self.scores.scores_mut(metric);
                scores.extend(graph.ids.iter().copied().zip(values));
            }
            Err(error) => {
                let failure = MetricFailure { metric, component, error };
                log::error!("Centrality metric failed: {}", failure);
                self.failures.push(failure);
            }
        }
    }
}

/// Cooperative cancellation flag shared with long-running computations
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

type RawResults = (Result<Vec<f64>>, Result<Vec<f64>>, Result<Vec<f64>>);

/// Runs the three centrality metrics
pub struct CentralityEngine {
    config: CentralityConfig,
    cancel: CancelToken,
}

impl CentralityEngine {
    pub fn new(config: CentralityConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Use an externally held cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Compute all three metrics over `graph` as a single graph
    pub fn compute(&self, graph: &Adjacency) -> CentralityOutcome {
        log::info!(
            "Computing centralities for {} nodes and {} edges",
            graph.node_count,
            graph.edge_count()
        );

        let mut outcome = CentralityOutcome::default();
        let (betweenness, closeness, eigenvector) = self.run_metrics(graph);
        outcome.record(graph, Metric::Betweenness, None, betweenness);
        outcome.record(graph, Metric::Closeness, None, closeness);
        outcome.record(graph, Metric::Eigenvector, None, eigenvector);

        log::info!("Centrality computation finished ({} failures)", outcome.failures.len());
        outcome
    }

    /// Compute metrics according to the configured mode
    ///
    /// `components` must be the partition of `graph`; it is only consulted
    /// in per-component mode.
    pub fn compute_with_mode(&self, graph: &Adjacency, components: &[ConnectedComponent]) -> CentralityOutcome {
        match self.config.mode {
            CentralityMode::Global => self.compute(graph),
            CentralityMode::PerComponent => self.compute_per_component(graph, components),
        }
    }

    /// Compute metrics independently inside each component
    pub fn compute_per_component(&self, graph: &Adjacency, components: &[ConnectedComponent]) -> CentralityOutcome {
        log::info!("Computing centralities for {} components", components.len());

        let results: Vec<(Adjacency, RawResults)> = components
            .par_iter()
            .map(|component| {
                let subgraph = graph.induced(&component.nodes);
                log::debug!(
                    "Component {}: {} nodes, {} edges",
                    component.id,
                    subgraph.node_count,
                    subgraph.edge_count()
                );
                let results = self.run_metrics(&subgraph);
                (subgraph, results)
            })
            .collect();

        let mut outcome = CentralityOutcome::default();
        for (component, (subgraph, (betweenness, closeness, eigenvector))) in components.iter().zip(results) {
            let id = Some(component.id);
            outcome.record(&subgraph, Metric::Betweenness, id, betweenness);
            outcome.record(&subgraph, Metric::Closeness, id, closeness);
            outcome.record(&subgraph, Metric::Eigenvector, id, eigenvector);
        }

        log::info!("Centrality computation finished ({} failures)", outcome.failures.len());
        outcome
    }

    fn run_metrics(&self, graph: &Adjacency) -> RawResults {
        let max_iter = self.config.max_iter;
        let tolerance = self.config.tolerance;

        let betweenness = || {
            log::debug!("Started betweenness centrality");
            betweenness::betweenness_centrality(graph, &self.cancel)
        };
        let closeness = || {
            log::debug!("Started closeness centrality");
            Ok::<_, Error>(closeness::closeness_centrality(graph))
        };
        let eigenvector = || {
            log::debug!("Started eigenvector centrality");
            eigenvector::eigenvector_centrality(graph, max_iter, tolerance)
        };

        if graph.node_count >= self.config.parallel_threshold {
            let (b, (c, e)) = rayon::join(betweenness, || rayon::join(closeness, eigenvector));
            (b, c, e)
        } else {
            (betweenness(), closeness(), eigenvector())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::partition;

    fn config(parallel_threshold: usize) -> CentralityConfig {
        CentralityConfig {
            parallel_threshold,
            ..Default::default()
        }
    }

    #[test]
    fn empty_graph_yields_empty_maps() {
        let adj = Adjacency::from_edges(Vec::new(), &[]);
        let outcome = CentralityEngine::new(config(0)).compute(&adj);
        assert!(outcome.is_complete());
        assert!(outcome.scores.betweenness.is_empty());
        assert!(outcome.scores.closeness.is_empty());
        assert!(outcome.scores.eigenvector.is_empty());
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let adj = Adjacency::from_edges(
            vec![10, 11, 12, 13, 14, 15],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (1, 4), (4, 5)],
        );
        let parallel = CentralityEngine::new(config(0)).compute(&adj).into_result().unwrap();
        let sequential = CentralityEngine::new(config(usize::MAX)).compute(&adj).into_result().unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn convergence_failure_is_flagged_and_other_metrics_survive() {
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3, 4], &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let engine = CentralityEngine::new(CentralityConfig {
            max_iter: 1,
            tolerance: 1e-12,
            ..config(0)
        });
        let outcome = engine.compute(&adj);

        assert!(outcome.failed(Metric::Eigenvector));
        assert!(!outcome.failed(Metric::Betweenness));
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].error, Error::Convergence { .. }));
        assert_eq!(outcome.scores.betweenness.len(), 5);
        assert_eq!(outcome.scores.closeness.len(), 5);
        assert!(outcome.scores.eigenvector.is_empty());
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn cancellation_flags_betweenness() {
        let adj = Adjacency::from_edges(vec![0, 1, 2], &[(0, 1), (1, 2)]);
        let cancel = CancelToken::new();
        let engine = CentralityEngine::new(config(0)).with_cancel_token(cancel.clone());
        cancel.cancel();

        let outcome = engine.compute(&adj);
        assert!(outcome.failed(Metric::Betweenness));
        assert!(!outcome.failed(Metric::Closeness));
        assert!(engine.cancel_token().is_cancelled());
    }

    #[test]
    fn per_component_mode_scores_components_independently() {
        // Path 0-1-2 plus pair 3-4 plus isolated 5
        let adj = Adjacency::from_edges(vec![0, 1, 2, 3, 4, 5], &[(0, 1), (1, 2), (3, 4)]);
        let components = partition(&adj);

        let per_component = CentralityEngine::new(config(0)).compute_with_mode(&adj, &components);
        let scores = &per_component.scores;
        assert!(per_component.is_complete());
        assert!((scores.closeness[&3] - 1.0).abs() < 1e-10);
        assert!((scores.betweenness[&1] - 1.0).abs() < 1e-10);
        assert_eq!(scores.closeness[&5], 0.0);
        assert!((scores.eigenvector[&5] - 1.0).abs() < 1e-10);
        assert!((scores.eigenvector[&3] - scores.eigenvector[&4]).abs() < 1e-10);

        let global = CentralityEngine::new(CentralityConfig {
            mode: CentralityMode::Global,
            ..config(0)
        })
        .compute_with_mode(&adj, &components);
        // The pair reaches 1 of 5 other nodes in the whole graph
        assert!((global.scores.closeness[&3] - 0.2).abs() < 1e-10);
    }

    #[test]
    fn restrict_reports_requested_ids_only() {
        let adj = Adjacency::from_edges(vec![1, 2], &[(0, 1)]);
        let scores = CentralityEngine::new(config(0)).compute(&adj).into_result().unwrap();

        let picked = scores.restrict(&[2, 99]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[&2].closeness, 1.0);
        assert_eq!(picked[&99], NodeCentrality::default());
        assert!(scores.restrict(&[]).is_empty());
        assert_eq!(scores.all().len(), 2);
    }
}
