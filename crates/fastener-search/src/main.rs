//! Fastener Search CLI - standards-aware product search
//!
//! Commands:
//! - `search` - Search indexed catalog chunks
//! - `classify` - Show how a query is understood
//! - `standard` - Show equivalents of a standard code
//! - `index` - Index a JSONL chunk file into Qdrant
//! - `status` - Check Qdrant and the embedding endpoint

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fastener_config::{ConfigLoader, ConfigOverrides, FastenerConfig, LogFormat};
use fastener_core::{
    classify_query, format_standard_for_display, normalize_standard_code, HybridRanker,
};
use fastener_search::{
    load_standard_table, ChunkIndexer, EmbeddingProvider, OpenAIProvider, ProductSearcher,
    QdrantConfig, QdrantStore, SearchRequest, SearchResponse,
};

/// Fastener Search - find fasteners by standard, thread and material
#[derive(Parser)]
#[command(name = "fastener-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the local `.fastener/config.toml`
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Qdrant server URL
    #[arg(long, global = true, env = "FASTENER_QDRANT_URL")]
    qdrant_url: Option<String>,

    /// Collection holding product chunks
    #[arg(long, global = true, env = "FASTENER_COLLECTION")]
    collection: Option<String>,

    /// Extra equivalence table (TOML)
    #[arg(long, global = true)]
    standards: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search indexed catalog chunks
    Search {
        /// Search query, e.g. "DIN 933 M8 A2"
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum vector similarity (0-1)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Do not send payload filters derived from the query
        #[arg(long)]
        no_filters: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the query analysis as JSON
    Classify {
        query: String,
    },

    /// Show the record and equivalents of a standard code
    Standard {
        /// Code such as "DIN 933" or "iso4017"
        code: String,
    },

    /// Index a JSONL chunk file into Qdrant
    Index {
        /// Newline-delimited chunk records
        chunks: PathBuf,

        /// Drop and recreate the collection first
        #[arg(long)]
        recreate: bool,
    },

    /// Check Qdrant and the embedding endpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        qdrant_url: cli.qdrant_url.clone(),
        collection: cli.collection.clone(),
        extra_table: cli.standards.clone(),
        log_level: cli.verbose.then(|| "debug".to_string()),
        ..Default::default()
    };
    let config = ConfigLoader::new()
        .load(&cli.config_dir, Some(&overrides))
        .context("Failed to load configuration")?;

    init_tracing(&config);

    match cli.command {
        Commands::Search {
            query,
            limit,
            threshold,
            no_filters,
            json,
        } => {
            let request = SearchRequest {
                limit,
                threshold,
                apply_filters: !no_filters,
            };
            cmd_search(&config, &query, request, json).await
        }
        Commands::Classify { query } => cmd_classify(&query),
        Commands::Standard { code } => cmd_standard(&config, &code),
        Commands::Index { chunks, recreate } => cmd_index(&config, chunks, recreate).await,
        Commands::Status => cmd_status(&config).await,
    }
}

fn init_tracing(config: &FastenerConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn connect_store(config: &FastenerConfig) -> Result<QdrantStore> {
    QdrantStore::connect(QdrantConfig::from_settings(&config.qdrant), &config.qdrant.collection)
        .await
        .context("Failed to connect to Qdrant")
}

fn embedder(config: &FastenerConfig) -> Result<Arc<OpenAIProvider>> {
    let provider = OpenAIProvider::from_settings(&config.embedding)
        .context("Failed to create embedding provider")?;
    Ok(Arc::new(provider))
}

/// Search the indexed catalog
async fn cmd_search(
    config: &FastenerConfig,
    query: &str,
    request: SearchRequest,
    json_output: bool,
) -> Result<()> {
    let store = connect_store(config).await?;
    let searcher = ProductSearcher::from_config(config, Arc::new(store), embedder(config)?)
        .context("Failed to build searcher")?;

    let response = searcher.search(query, request).await.context("Search failed")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

fn print_response(response: &SearchResponse) {
    println!(
        "Search [{}]: \"{}\" ({} results in {}ms)\n",
        response.analysis.query_type, response.query, response.total, response.took_ms
    );

    for (i, item) in response.results.iter().enumerate() {
        let marker = if item.exact_match { " [exact]" } else { "" };
        println!("{}. {}{}", i + 1, item.id, marker);
        println!("   Score: {:.1} (vector {:.3})", item.score, item.vector_score);
        if let Some(ref standard) = item.standard {
            println!("   Standard: {}", standard);
        }
        let source: Vec<&str> = [
            item.document.supplier.as_deref(),
            item.document.filename.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !source.is_empty() {
            println!("   Source: {}", source.join(" / "));
        }
        println!("   {}", item.snippet);
        println!();
    }

    if let Some(ref suggestion) = response.suggestions {
        if !suggestion.equivalents.is_empty() {
            println!(
                "Equivalents of {}: {}",
                suggestion.display,
                suggestion.equivalents.join(", ")
            );
        }
    }
}

/// Print the classifier output
fn cmd_classify(query: &str) -> Result<()> {
    let analysis = classify_query(query);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

/// Print what the equivalence table knows about a code
fn cmd_standard(config: &FastenerConfig, raw: &str) -> Result<()> {
    let Some(code) = normalize_standard_code(raw) else {
        bail!("Not a recognizable standard code: {:?}", raw);
    };

    let table = load_standard_table(&config.standards).context("Failed to load equivalence table")?;
    let ranker = HybridRanker::new(Arc::new(table));
    let suggestion = ranker.get_standard_suggestions(&code);

    println!("{}", format_standard_for_display(&code));
    match suggestion.record {
        Some(ref record) => println!("  {} ({})", record.name, record.category),
        None => println!("  Not in the equivalence table"),
    }
    for equivalent in &suggestion.equivalents {
        println!("  = {}", equivalent);
    }
    Ok(())
}

/// Index a chunk file
async fn cmd_index(config: &FastenerConfig, chunks: PathBuf, recreate: bool) -> Result<()> {
    let start = Instant::now();
    let store = connect_store(config).await?;
    let indexer = ChunkIndexer::new(store, embedder(config)?, config.qdrant.vector_dimension)
        .with_embedding_batch_size(config.embedding.batch_size);

    info!("Indexing {} into '{}'", chunks.display(), config.qdrant.collection);
    let stats = indexer
        .index_file(&chunks, recreate)
        .await
        .with_context(|| format!("Failed to index {}", chunks.display()))?;

    println!("Indexing complete!");
    println!("  Collection: {}", config.qdrant.collection);
    println!("  Records read: {}", stats.total_processed);
    println!("  Indexed: {}", stats.total_indexed);
    println!("  Skipped (blank): {}", stats.total_skipped);
    println!("  Failed: {}", stats.total_failed);
    println!("  Total time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Show index and embedding status
async fn cmd_status(config: &FastenerConfig) -> Result<()> {
    println!("Index Status");
    println!("============");
    println!("  Qdrant URL: {}", config.qdrant.url);
    println!("  Collection: {}", config.qdrant.collection);

    match connect_store(config).await {
        Ok(store) => match store.point_count().await? {
            Some(count) => println!("  Status: Indexed ({} points)", count),
            None => println!("  Status: Not indexed (collection does not exist)"),
        },
        Err(e) => {
            println!("  Status: Connection failed");
            println!("  Error: {:#}", e);
        }
    }

    println!("\nEmbeddings");
    println!("==========");
    let status = embedder(config)?.check_status().await?;
    println!("  Endpoint: {}", status.endpoint);
    println!("  Model: {}", status.model);
    if status.available {
        let latency = status.latency_ms.map(|ms| format!(" ({}ms)", ms)).unwrap_or_default();
        println!("  Status: Available{}", latency);
    } else {
        println!("  Status: Unavailable");
        println!("  Error: {}", status.error.unwrap_or_default());
    }
    Ok(())
}
