//! Command line entry point.
//!
//! ```bash
//! paper-explorer index --input data/papers.csv
//! paper-explorer search --query "graph neural networks" --top-k 10
//! paper-explorer cluster --n-clusters 20
//! paper-explorer serve --bind 127.0.0.1:8080
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use paper_explorer::{
    cluster::{build_clusters, ClusterSummary},
    config::ExplorerConfig,
    index::build_index,
    paper::CorpusLoader,
    search::{ScoredPaper, SearchEngine},
    server,
    store::ArtifactStore,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_CONFIG: &str = "paper-explorer.json";

/// Output format for search results
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "paper-explorer",
    version,
    about = "TF-IDF search and topic clustering over a corpus of academic papers"
)]
struct Args {
    /// JSON config file; missing fields take their defaults
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the index artifacts
    #[arg(long, value_name = "DIR", global = true)]
    models_dir: Option<PathBuf>,

    /// Logging verbosity level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info", value_name = "LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the paper table, fit TF-IDF and save the index
    Index {
        /// Paper table (CSV)
        #[arg(long, value_name = "CSV")]
        input: Option<PathBuf>,
        /// Vocabulary cap
        #[arg(long, value_name = "N")]
        max_features: Option<usize>,
    },
    /// Rank papers against a free-text query
    Search {
        #[arg(long, value_name = "TEXT")]
        query: String,
        #[arg(long, value_name = "N", default_value = "5")]
        top_k: usize,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Group indexed papers into topical clusters
    Cluster {
        #[arg(long, value_name = "K")]
        n_clusters: Option<usize>,
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,
        #[arg(long, value_name = "N")]
        n_init: Option<usize>,
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },
    /// Serve the search page and JSON API
    Serve {
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

fn load_config(args: &Args) -> Result<ExplorerConfig> {
    let path = args.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = ExplorerConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(dir) = &args.models_dir {
        config.models_dir = dir.clone();
    }
    Ok(config)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
}

/// Format results as a pretty table
fn format_results_table(results: &[ScoredPaper]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Authors").add_attribute(Attribute::Bold),
        Cell::new("Venue").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("Citations").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
    ]);

    for (idx, result) in results.iter().enumerate() {
        let paper = &result.paper;
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(truncate(&paper.title, 60)),
            Cell::new(truncate(&paper.authors_str, 40)),
            Cell::new(truncate(&paper.venue, 24)),
            Cell::new(paper.year.map_or_else(|| "-".to_string(), |y| y.to_string())),
            Cell::new(paper.n_citation),
            Cell::new(format!("{:.4}", result.similarity)),
        ]);
    }
    table.to_string()
}

fn format_summary_table(summaries: &[ClusterSummary]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Cluster").add_attribute(Attribute::Bold),
        Cell::new("Papers").add_attribute(Attribute::Bold),
        Cell::new("Avg citations").add_attribute(Attribute::Bold),
        Cell::new("Years").add_attribute(Attribute::Bold),
        Cell::new("Top terms").add_attribute(Attribute::Bold),
    ]);
    for s in summaries {
        let years = match (s.min_year, s.max_year) {
            (Some(lo), Some(hi)) => format!("{}-{}", lo, hi),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(s.cluster),
            Cell::new(s.n_papers),
            Cell::new(s.avg_citations.map_or_else(|| "-".to_string(), |a| format!("{:.1}", a))),
            Cell::new(years),
            Cell::new(truncate(&s.top_terms, 80)),
        ]);
    }
    table.to_string()
}

fn load_engine(store: &ArtifactStore) -> Result<SearchEngine> {
    let index = store
        .load_index()
        .with_context(|| format!("Failed to load index from {} (run `index` first)", store.root().display()))?;
    SearchEngine::from_index(index).context("Index artifacts do not line up")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);
    let mut config = load_config(&args)?;
    let store = ArtifactStore::new(config.models_dir.clone());

    match args.command {
        Command::Index { input, max_features } => {
            if let Some(input) = input {
                config.data_path = input;
            }
            if let Some(max_features) = max_features {
                config.index.max_features = max_features;
            }
            let start = Instant::now();
            let corpus = CorpusLoader::load(&config.data_path)
                .with_context(|| format!("Failed to load papers from {}", config.data_path.display()))?;
            let (vectorizer, matrix) = build_index(&corpus, &config.index, &store)
                .context("Failed to build index")?;
            info!(
                papers = matrix.n_rows(),
                vocab = vectorizer.vocab_size(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "index ready"
            );
            println!("Index built: {} papers, {} terms, saved to {}", matrix.n_rows(), vectorizer.vocab_size(), store.root().display());
        }
        Command::Search { query, top_k, format } => {
            let engine = load_engine(&store)?;
            let start = Instant::now();
            let results = engine.search(&query, top_k).context("Search failed")?;
            info!(elapsed_ms = start.elapsed().as_millis() as u64, hits = results.len(), "search finished");
            match format {
                OutputFormat::Table => println!("{}", format_results_table(&results)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&results).context("Failed to serialize results to JSON")?
                ),
            }
        }
        Command::Cluster { n_clusters, batch_size, n_init, seed } => {
            let cluster_config = &mut config.cluster;
            if let Some(k) = n_clusters {
                cluster_config.n_clusters = k;
            }
            if let Some(b) = batch_size {
                cluster_config.batch_size = b;
            }
            if let Some(n) = n_init {
                cluster_config.n_init = n;
            }
            if let Some(s) = seed {
                cluster_config.seed = s;
            }
            let output = build_clusters(&store, &config.cluster).context("Clustering failed")?;
            println!("{}", format_summary_table(&output.summaries));
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let engine = Arc::new(load_engine(&store)?);
            server::serve(engine, &config.server)
                .await
                .with_context(|| format!("Server on {} failed", config.server.bind))?;
        }
    }

    Ok(())
}
