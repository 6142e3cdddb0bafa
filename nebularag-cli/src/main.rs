//! NebulaRAG CLI — ask a question over a local document directory.
//!
//! Reads `.txt`/`.md` files, indexes them through the NebulaBlock
//! embeddings endpoint, and answers one question with retrieval, reranking,
//! and source attribution.

use clap::Parser;
use nebularag_core::{
    NebulaClient, PipelineOptions, RagPipeline, Settings, read_text_files,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// NebulaRAG: minimal RAG pipeline over the NebulaBlock inference API.
#[derive(Parser, Debug)]
#[command(name = "nebularag", version, about, long_about = None)]
struct Cli {
    /// Path to the docs directory (txt/md)
    #[arg(long)]
    docs: PathBuf,

    /// Question to ask
    #[arg(long)]
    question: String,

    /// Size of text chunks in characters (default from RAG_CHUNK_SIZE, else 800)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Overlap between consecutive chunks (default from RAG_CHUNK_OVERLAP, else 120)
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Number of candidates to retrieve (default from RAG_TOP_K, else 12)
    #[arg(long)]
    top_k: Option<usize>,

    /// Number of candidates kept after reranking (default from RAG_RERANK_K, else 6)
    #[arg(long)]
    rerank_k: Option<usize>,
}

/// Fold CLI overrides into the environment-derived settings.
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(v) = cli.chunk_size {
        settings.chunk_size = v;
    }
    if let Some(v) = cli.chunk_overlap {
        settings.chunk_overlap = v;
    }
    if let Some(v) = cli.top_k {
        settings.top_k = v;
    }
    if let Some(v) = cli.rerank_k {
        settings.rerank_k = v;
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}:");
    println!("{}", "=".repeat(60));
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load()?;
    apply_overrides(&mut settings, &cli);
    // Configuration failures surface here, before any network call.
    settings.validate()?;
    if settings.rerank_k > settings.top_k {
        tracing::warn!(
            "rerank-k ({}) > top-k ({}); reranking cannot add candidates",
            settings.rerank_k,
            settings.top_k
        );
    }

    println!("Model Configuration:");
    println!("  Embedding Model: {}", settings.embedding_model);
    println!("  Reranker Model:  {}", settings.reranker_model);
    println!("  Chat Model:      {}", settings.chat_model);
    println!();

    let client = NebulaClient::new(&settings)?;
    let mut rag = RagPipeline::new(client, PipelineOptions::from(&settings));

    println!("Reading documents from {}...", cli.docs.display());
    let docs = read_text_files(&cli.docs)?;
    println!("Found {} documents", docs.len());

    println!("Indexing documents...");
    let num_chunks = rag.index_texts(&docs).await?;
    println!("Indexed {} chunks from {} files.", num_chunks, docs.len());

    println!("Processing question...");
    let result = rag.answer(&cli.question, None).await?;

    print_banner("ANSWER");
    println!("{}", result.answer);

    print_banner("SOURCES");
    for (i, src) in result.sources.iter().enumerate() {
        let first_line = src.lines().next().unwrap_or(src);
        println!("{}. {}", i + 1, truncate(first_line, 120));
    }

    print_banner("MODELS USED");
    println!("Embedding Model: {}", result.models.embedding);
    println!("Reranker Model:  {}", result.models.reranker);
    println!("Chat Model:      {}", result.models.chat);

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
