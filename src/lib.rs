//! Core library functions for the friend graph analyzer

pub mod centrality;
pub mod cluster;
pub mod config;
pub mod crawl;
pub mod data;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod storage;
pub mod viz;

pub use error::{Error, Result};
pub use pipeline::{analyze, analyze_graph, Analysis};
