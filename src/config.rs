//! Configuration management for the friend graph analyzer

use std::time::Duration;

use crate::centrality::CentralityMode;
use crate::graph::builder::{NamePolicy, VisitScope};

/// Top-level configuration, constructed once at startup and handed to each stage
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub build: BuildOptions,
    pub centrality: CentralityConfig,
    pub visual: VisualConfig,
    pub crawl: CrawlConfig,
}

/// Options controlling how nested friend records become a graph
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Scope of the visited-set used while expanding nested friend lists
    pub scope: VisitScope,

    /// How repeated identifiers merge their name attributes
    pub names: NamePolicy,
}

/// Options for the centrality engine
#[derive(Debug, Clone, Copy)]
pub struct CentralityConfig {
    /// Maximum power iterations for eigenvector centrality
    pub max_iter: usize,

    /// Convergence tolerance for eigenvector centrality
    pub tolerance: f64,

    /// Graphs with at least this many nodes run the three metrics concurrently
    pub parallel_threshold: usize,

    /// Whether metrics are computed over the whole graph or per component
    pub mode: CentralityMode,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tolerance: 1e-6,
            parallel_threshold: 1000,
            mode: CentralityMode::PerComponent,
        }
    }
}

/// Mapping constants from normalized scores to visual attributes
#[derive(Debug, Clone, Copy)]
pub struct VisualConfig {
    /// Node size when normalized betweenness is zero
    pub size_base: f64,

    /// Added to the base size at normalized betweenness one
    pub size_scale: f64,

    /// Normalized value used when a component has a single distinct score
    pub midpoint: f64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            size_base: 10.0,
            size_scale: 40.0,
            midpoint: 0.5,
        }
    }
}

/// Pacing for the friend crawler
#[derive(Debug, Clone, Copy)]
pub struct CrawlConfig {
    /// Pause before each friends request
    pub request_interval: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            request_interval: Duration::from_secs(2),
        }
    }
}

impl CrawlConfig {
    /// Crawl without pausing between requests
    pub fn unpaced() -> Self {
        Self {
            request_interval: Duration::ZERO,
        }
    }
}
