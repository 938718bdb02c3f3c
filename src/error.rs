//! Error types for the friend graph analyzer

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the analysis pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// The input file is missing, unreadable or not valid JSON
    #[error("data unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    /// Power iteration hit its iteration bound before reaching the tolerance
    #[error("eigenvector centrality failed to converge in {iterations} iterations (tolerance {tolerance})")]
    Convergence { iterations: usize, tolerance: f64 },

    /// A long-running computation observed its cancellation token
    #[error("computation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("graph snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
