//! Results persistence module

use anyhow::Result;
use serde_json::{json, to_string_pretty, Value};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::centrality::{Metric, Scores};
use crate::cluster::metrics::{density, top_members};
use crate::data::{Records, UserId};
use crate::error;
use crate::graph::{FriendGraph, GraphSnapshot};
use crate::pipeline::Analysis;

/// Components listed individually in the summary
const SUMMARY_COMPONENTS: usize = 10;

/// Members listed per component and metric in the summary
const TOP_MEMBERS: usize = 5;

/// Save analysis results to the specified directory
///
/// With `ids` given, `centralities.json` holds only those users; otherwise
/// it holds every node.
pub fn save_results(analysis: &Analysis, ids: Option<&[UserId]>, output_dir: impl AsRef<Path>) -> Result<()> {
    let output_dir = output_dir.as_ref();
    log::info!("Saving results to {}", output_dir.display());

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_summary(analysis, output_dir)?;
    save_centralities(analysis, ids, output_dir)?;
    save_nodes_csv(analysis, output_dir)?;
    save_edges_csv(&analysis.graph, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save summary information
fn save_summary(analysis: &Analysis, output_dir: &Path) -> Result<()> {
    log::info!("Saving summary information");

    let graph = &analysis.graph;
    let components = &analysis.components;
    let scores = &analysis.outcome.scores;

    let path = output_dir.join("summary.json");
    let mut file = File::create(path)?;

    let component_details: Vec<Value> = components
        .iter()
        .take(SUMMARY_COMPONENTS)
        .map(|c| {
            let top = |metric: Metric| {
                top_members(c, scores.scores(metric), TOP_MEMBERS)
                    .into_iter()
                    .map(|(id, score)| json!({ "id": id, "score": score }))
                    .collect::<Vec<_>>()
            };
            json!({
                "id": c.id,
                "size": c.size(),
                "edge_count": c.edge_count,
                "density": density(c),
                "top_betweenness": top(Metric::Betweenness),
                "top_closeness": top(Metric::Closeness),
                "top_eigenvector": top(Metric::Eigenvector),
            })
        })
        .collect();

    let summary = json!({
        "graph_stats": {
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "avg_degree": if graph.node_count() == 0 {
                0.0
            } else {
                2.0 * graph.edge_count() as f64 / graph.node_count() as f64
            },
            "structural_warnings": analysis.warnings.len(),
        },
        "component_stats": {
            "component_count": components.len(),
            "singleton_count": components.iter().filter(|c| c.is_singleton()).count(),
            "largest_component_size": components.first().map_or(0, |c| c.size()),
            "components": component_details,
        },
        "centrality_stats": {
            "mode": format!("{:?}", analysis.mode),
            "betweenness": metric_stats(&scores.betweenness),
            "closeness": metric_stats(&scores.closeness),
            "eigenvector": metric_stats(&scores.eigenvector),
        },
        "failures": analysis.outcome.failures.iter().map(|f| json!({
            "metric": f.metric,
            "component": f.component,
            "error": f.error.to_string(),
        })).collect::<Vec<_>>(),
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Mean, standard deviation and range of a metric; null when empty
fn metric_stats(scores: &Scores) -> Value {
    if scores.is_empty() {
        return Value::Null;
    }

    let std_dev = if scores.len() > 1 {
        json!(Statistics::std_dev(scores.values()))
    } else {
        Value::Null
    };

    json!({
        "count": scores.len(),
        "mean": Statistics::mean(scores.values()),
        "std_dev": std_dev,
        "min": Statistics::min(scores.values()),
        "max": Statistics::max(scores.values()),
    })
}

/// Save per-user scores
fn save_centralities(analysis: &Analysis, ids: Option<&[UserId]>, output_dir: &Path) -> Result<()> {
    let scores = &analysis.outcome.scores;
    let selected = match ids {
        Some(ids) => scores.restrict(ids),
        None => scores.all(),
    };
    log::info!("Saving centralities for {} users", selected.len());

    let path = output_dir.join("centralities.json");
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(&selected)?.as_bytes())?;

    Ok(())
}

/// Save node attributes with component assignments
fn save_nodes_csv(analysis: &Analysis, output_dir: &Path) -> Result<()> {
    let component_of: HashMap<UserId, usize> = analysis
        .components
        .iter()
        .flat_map(|c| c.members.iter().map(move |&id| (id, c.id)))
        .collect();

    let path = output_dir.join("nodes.csv");
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "id,first_name,last_name,appearances,component")?;
    for person in analysis.graph.people() {
        let component = component_of
            .get(&person.id)
            .map(|c| c.to_string())
            .unwrap_or_default();
        writeln!(
            file,
            "{},{},{},{},{}",
            person.id,
            csv_field(person.first_name.as_deref().unwrap_or("")),
            csv_field(person.last_name.as_deref().unwrap_or("")),
            person.appearances,
            component
        )?;
    }
    file.flush()?;

    Ok(())
}

/// Save the edge list with observation counts
fn save_edges_csv(graph: &FriendGraph, output_dir: &Path) -> Result<()> {
    let path = output_dir.join("edges.csv");
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "source,target,observations")?;
    for (source, target, link) in graph.edges() {
        writeln!(file, "{},{},{}", source, target, link.observations)?;
    }
    file.flush()?;

    Ok(())
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Merge `records` into the records file at `path`
///
/// Existing entries for the same user are replaced. An existing file that
/// cannot be parsed is logged and replaced.
pub fn save_records(records: &Records, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let mut merged: Records = if path.exists() {
        let reader = BufReader::new(File::open(path)?);
        match serde_json::from_reader(reader) {
            Ok(existing) => existing,
            Err(e) => {
                log::warn!("Existing records file {} is unreadable, starting fresh: {}", path.display(), e);
                Records::new()
            }
        }
    } else {
        Records::new()
    };

    merged.extend(records.iter().map(|(id, record)| (*id, record.clone())));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(&merged)?.as_bytes())?;

    log::info!("Saved {} user records to {}", merged.len(), path.display());
    Ok(())
}

/// Write a binary snapshot of the graph
pub fn save_snapshot(graph: &FriendGraph, path: impl AsRef<Path>) -> error::Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &graph.to_snapshot())?;
    log::info!("Wrote graph snapshot to {}", path.display());
    Ok(())
}

/// Read a graph snapshot written by [`save_snapshot`]
pub fn load_snapshot(path: impl AsRef<Path>) -> error::Result<FriendGraph> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| error::Error::DataUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let snapshot: GraphSnapshot = bincode::deserialize_from(BufReader::new(file))?;

    let graph = FriendGraph::from_snapshot(snapshot);
    log::info!(
        "Loaded graph snapshot with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::{FriendEdge, UserRecord};
    use crate::pipeline::analyze_graph;

    fn record(first: &str, friends: Vec<FriendEdge>) -> UserRecord {
        UserRecord {
            first_name: first.to_string(),
            last_name: "Test".to_string(),
            friends,
        }
    }

    fn sample_graph() -> FriendGraph {
        let mut graph = FriendGraph::new();
        for id in [1, 2, 3] {
            graph.upsert(id);
        }
        graph.upsert(1).first_name = Some("Smith, Jr.".into());
        graph.connect(1, 2);
        graph.connect(2, 3);
        graph
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn save_records_merges_with_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("friends.json");

        let mut first = Records::new();
        first.insert(1, record("One", vec![FriendEdge::new(2, "Two", "Test")]));
        save_records(&first, &path).unwrap();

        let mut second = Records::new();
        second.insert(3, record("Three", Vec::new()));
        second.insert(1, record("Uno", Vec::new()));
        save_records(&second, &path).unwrap();

        let stored: Records = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[&1].first_name, "Uno");
        assert_eq!(stored[&3].first_name, "Three");

        let raw: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert!(raw.get("1").is_some());
    }

    #[test]
    fn save_records_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("friends.json");
        fs::write(&path, "{ not json").unwrap();

        let mut records = Records::new();
        records.insert(5, record("Five", Vec::new()));
        save_records(&records, &path).unwrap();

        let stored: Records = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored.keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn snapshot_round_trip_preserves_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let graph = sample_graph();

        save_snapshot(&graph, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.edge_set(), graph.edge_set());
        assert_eq!(loaded.person(1).unwrap().first_name.as_deref(), Some("Smith, Jr."));
    }

    #[test]
    fn missing_snapshot_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, error::Error::DataUnavailable { .. }));
    }

    #[test]
    fn save_results_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = analyze_graph(sample_graph(), Vec::new(), &Config::default());

        save_results(&analysis, Some(&[2]), dir.path()).unwrap();

        let centralities: Value =
            serde_json::from_slice(&fs::read(dir.path().join("centralities.json")).unwrap()).unwrap();
        assert_eq!(centralities.as_object().unwrap().len(), 1);
        assert!((centralities["2"]["betweenness"].as_f64().unwrap() - 1.0).abs() < 1e-10);

        let summary: Value = serde_json::from_slice(&fs::read(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["graph_stats"]["node_count"], 3);
        assert_eq!(summary["component_stats"]["component_count"], 1);
        assert_eq!(summary["component_stats"]["components"][0]["top_betweenness"][0]["id"], 2);
        assert!(summary["failures"].as_array().unwrap().is_empty());

        let nodes = fs::read_to_string(dir.path().join("nodes.csv")).unwrap();
        assert!(nodes.starts_with("id,first_name,last_name,appearances,component\n"));
        assert!(nodes.contains("1,\"Smith, Jr.\",,0,0"));

        let edges = fs::read_to_string(dir.path().join("edges.csv")).unwrap();
        assert_eq!(edges.lines().count(), 3);
    }
}
