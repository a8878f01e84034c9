//! Insight Engine CLI
//!
//! Clusters a file of notes into semantic groups, or ranks them against a
//! query, and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use insight_engine::cluster::{ClusterOrchestrator, ClustersResponse, Note};
use insight_engine::config::EngineConfig;
use insight_engine::embedding::{EmbeddingProvider, FastEmbedProvider, HashEmbedder};
use insight_engine::search::{SearchCandidate, SearchEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Group notes into semantic clusters
    Cluster {
        /// JSON file with notes: [{"id": 1, "text": "..."}, ...]
        #[arg(long)]
        input: PathBuf,

        /// Similarity threshold in (0, 1] (overrides config)
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Rank notes against a query by semantic similarity
    Search {
        /// JSON file with notes: [{"id": 1, "text": "..."}, ...]
        #[arg(long)]
        input: PathBuf,

        /// Query text
        query: String,
    },
}

#[derive(Parser, Debug)]
#[command(name = "insight-engine")]
#[command(version = "0.1.0")]
#[command(about = "Semantic clustering and search for personal notes", long_about = None)]
struct Args {
    /// Configuration file path (overrides defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the deterministic hash embedder instead of downloading a model
    #[arg(long)]
    offline: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn read_notes(path: &Path) -> Result<Vec<Note>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read notes file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse notes file: {:?}", path))
}

async fn build_provider(config: &EngineConfig, offline: bool) -> Result<Arc<dyn EmbeddingProvider>> {
    if offline || config.embedding.offline {
        tracing::info!("Using deterministic hash embedder (offline mode)");
        return Ok(Arc::new(HashEmbedder::new(config.embedding.dimension)));
    }

    let provider = FastEmbedProvider::from_config(&config.embedding)
        .await
        .context("Failed to initialize embedding model")?;
    Ok(Arc::new(provider))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("insight_engine=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insight_engine=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = EngineConfig::load(args.config.as_deref())?;
    let provider = build_provider(&config, args.offline).await?;

    match args.command {
        Command::Cluster { input, threshold } => {
            let notes = read_notes(&input)?;
            let threshold = threshold.unwrap_or(config.cluster_threshold);

            let orchestrator = ClusterOrchestrator::with_threshold(provider, threshold);
            let clusters = orchestrator.cluster_notes(&notes, None).await?;

            let response = ClustersResponse { clusters };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Search { input, query } => {
            let notes = read_notes(&input)?;

            // Embed every note up front; the stored-vector path belongs to the
            // persistence layer, which the CLI stands in for here.
            let texts: Vec<String> = notes.iter().map(|n| n.text.clone()).collect();
            let vectors = provider.embed_batch(&texts).await?;

            let candidates: Vec<SearchCandidate> = notes
                .iter()
                .zip(vectors)
                .map(|(note, vector)| SearchCandidate {
                    id: note.id,
                    summary: note.text.clone(),
                    vector: Some(vector),
                })
                .collect();

            let engine = SearchEngine::new(provider);
            let response = engine.search(&query, candidates).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
