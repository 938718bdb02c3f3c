//! Betweenness centrality via Brandes' algorithm.
//!
//! For each source node a BFS counts shortest paths, then dependencies are
//! accumulated in reverse BFS order. Sources are processed in fixed-size
//! chunks on the rayon pool; chunk partials are summed in chunk order so the
//! result does not depend on the number of worker threads.
//!
//! Complexity: O(V * E). Scores are normalized by `(n-1)(n-2)` for `n > 2`,
//! which for an undirected graph gives the fraction of shortest paths between
//! other pairs that pass through the node.

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::centrality::CancelToken;
use crate::error::{Error, Result};
use crate::graph::Adjacency;

/// Sources per parallel work unit
const SOURCE_CHUNK: usize = 64;

/// Reusable per-source buffers
struct Workspace {
    stack: Vec<u32>,
    predecessors: Vec<Vec<u32>>,
    sigma: Vec<f64>,
    dist: Vec<i64>,
    delta: Vec<f64>,
    queue: VecDeque<u32>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Self {
            stack: Vec::with_capacity(n),
            predecessors: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![-1; n],
            delta: vec![0.0; n],
            queue: VecDeque::with_capacity(n),
        }
    }

    /// Reset only the entries touched by the previous source
    fn reset(&mut self) {
        for &v in &self.stack {
            let v = v as usize;
            self.predecessors[v].clear();
            self.sigma[v] = 0.0;
            self.dist[v] = -1;
            self.delta[v] = 0.0;
        }
        self.stack.clear();
        self.queue.clear();
    }
}

/// Compute normalized betweenness centrality, indexed by node
///
/// The cancellation token is checked before each source node.
pub fn betweenness_centrality(graph: &Adjacency, cancel: &CancelToken) -> Result<Vec<f64>> {
    let n = graph.node_count;
    if n == 0 {
        return Ok(Vec::new());
    }

    log::debug!("Betweenness: accumulating over {} sources", n);

    let sources: Vec<u32> = (0..n as u32).collect();
    let partials: Vec<Result<Vec<f64>>> = sources
        .par_chunks(SOURCE_CHUNK)
        .map(|chunk| {
            let mut acc = vec![0.0; n];
            let mut ws = Workspace::new(n);
            for &s in chunk {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                accumulate(graph, s, &mut ws, &mut acc);
            }
            Ok(acc)
        })
        .collect();

    let mut cb = vec![0.0; n];
    for partial in partials {
        for (total, value) in cb.iter_mut().zip(partial?) {
            *total += value;
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for value in cb.iter_mut() {
            *value *= scale;
        }
    }

    Ok(cb)
}

/// Add the dependencies of source `s` to `acc`
fn accumulate(graph: &Adjacency, s: u32, ws: &mut Workspace, acc: &mut [f64]) {
    ws.reset();

    let si = s as usize;
    ws.sigma[si] = 1.0;
    ws.dist[si] = 0;
    ws.queue.push_back(s);

    while let Some(v) = ws.queue.pop_front() {
        let vi = v as usize;
        ws.stack.push(v);

        for &w in graph.neighbors(vi) {
            let wi = w as usize;

            // First visit to w?
            if ws.dist[wi] < 0 {
                ws.dist[wi] = ws.dist[vi] + 1;
                ws.queue.push_back(w);
            }

            // Shortest path to w via v?
            if ws.dist[wi] == ws.dist[vi] + 1 {
                ws.sigma[wi] += ws.sigma[vi];
                ws.predecessors[wi].push(v);
            }
        }
    }

    // Farthest nodes first
    for &w in ws.stack.iter().rev() {
        let wi = w as usize;
        let coefficient = (1.0 + ws.delta[wi]) / ws.sigma[wi];
        for &v in &ws.predecessors[wi] {
            let vi = v as usize;
            ws.delta[vi] += ws.sigma[vi] * coefficient;
        }
        if wi != si {
            acc[wi] += ws.delta[wi];
        }
    }
}
