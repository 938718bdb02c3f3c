use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use friend_graph_analyzer::centrality::CentralityMode;
use friend_graph_analyzer::config::Config;
use friend_graph_analyzer::data::records::{load_raw_records, load_user_ids};
use friend_graph_analyzer::graph::builder::{NamePolicy, VisitScope};
use friend_graph_analyzer::pipeline::{analyze, analyze_graph, Analysis};
use friend_graph_analyzer::{storage, viz};

#[derive(Parser, Debug)]
#[clap(
    name = "friend-graph-analyzer",
    about = "Centrality and component analysis of nested friend records"
)]
struct Cli {
    /// Path to the friend records JSON file, or a `.bin` graph snapshot
    #[clap(long)]
    input: PathBuf,

    /// Output directory for results
    #[clap(long, default_value = "friend_results")]
    output_dir: PathBuf,

    /// JSON array of user ids whose scores are reported (default: all users)
    #[clap(long)]
    ids: Option<PathBuf>,

    /// Compute metrics over the whole graph or per connected component
    #[clap(long, value_enum, default_value_t = CentralityMode::PerComponent)]
    mode: CentralityMode,

    /// Scope of the visited set while expanding nested friend lists
    #[clap(long, value_enum, default_value_t = VisitScope::PerRoot)]
    scope: VisitScope,

    /// How repeated users merge their names
    #[clap(long, value_enum, default_value_t = NamePolicy::TopLevelWins)]
    names: NamePolicy,

    /// Maximum power iterations for eigenvector centrality
    #[clap(long, default_value = "10000")]
    max_iter: usize,

    /// Convergence tolerance for eigenvector centrality
    #[clap(long, default_value = "1e-6")]
    tolerance: f64,

    /// Write a binary snapshot of the built graph to this path
    #[clap(long)]
    snapshot: Option<PathBuf>,

    /// Skip visualizations
    #[clap(long)]
    skip_viz: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        config.build.scope = self.scope;
        config.build.names = self.names;
        config.centrality.mode = self.mode;
        config.centrality.max_iter = self.max_iter;
        config.centrality.tolerance = self.tolerance;
        config
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = args.config();

    log::info!("Starting friend graph analysis");
    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output_dir.display());

    // 1. Load data and build the graph
    let analysis = load_and_analyze(&args.input, &config)?;

    if !analysis.warnings.is_empty() {
        log::warn!("Input had {} structural warnings", analysis.warnings.len());
    }
    log::info!(
        "Graph has {} nodes, {} edges and {} components",
        analysis.graph.node_count(),
        analysis.graph.edge_count(),
        analysis.components.len()
    );

    if let Some(path) = &args.snapshot {
        storage::save_snapshot(&analysis.graph, path)?;
    }

    // 2. Save results
    let ids = args.ids.as_ref().map(load_user_ids).transpose()?;
    storage::save_results(&analysis, ids.as_deref(), &args.output_dir)?;

    // 3. Generate visualizations if requested
    if !args.skip_viz {
        viz::write_view(&analysis.view(&config), &args.output_dir)?;
    }

    for failure in &analysis.outcome.failures {
        log::warn!("Scores missing for {}", failure);
    }

    log::info!("Analysis complete. Results saved to {}", args.output_dir.display());

    Ok(())
}

fn load_and_analyze(input: &Path, config: &Config) -> Result<Analysis> {
    if input.extension().is_some_and(|ext| ext == "bin") {
        let graph = storage::load_snapshot(input)?;
        Ok(analyze_graph(graph, Vec::new(), config))
    } else {
        let records = load_raw_records(input)?;
        log::info!("Loaded {} top-level records", records.len());
        Ok(analyze(&records, config))
    }
}
