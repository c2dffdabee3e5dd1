use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use textvault_core::{Embedding, SearchStrategy};
use textvault_embeddings::{OpenAiEmbedding, OpenAiEmbeddingConfig};
use textvault_retrieval::{
    DocumentLoader, HashEmbedder, IndexBuilder, RecursiveCharacterTextSplitter, Retriever,
    TextLoader,
};
use textvault_store::LocalVectorStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DB_DIR: &str = "./db";
const OFFLINE_DIMENSION: usize = 256;

/// Convert a text file into a persisted, queryable vector index.
///
/// Chunking, embedding model and database directory are library defaults;
/// re-running against an already populated `./db` reuses the index instead of
/// re-embedding.
#[derive(Debug, Parser)]
#[command(name = "textvault", version, about)]
struct Cli {
    /// Path to the text file to ingest.
    text_file_path: PathBuf,

    /// Metadata attached to the document before chunking. Repeatable.
    #[arg(long = "metadata", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    metadata: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid metadata entry '{raw}', expected key=value"))?;
    if key.is_empty() {
        return Err(format!("invalid metadata entry '{raw}', key must not be empty"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if std::env::var_os("TEXTVAULT_OFFLINE").is_some() {
        info!("TEXTVAULT_OFFLINE set, using the deterministic hash embedder");
        return run(cli, HashEmbedder::new(OFFLINE_DIMENSION)).await;
    }

    let api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY is not set (export it or put it in a .env file)")?;
    run(cli, OpenAiEmbedding::new(OpenAiEmbeddingConfig::new(api_key))).await
}

async fn run<E>(cli: Cli, embedder: E) -> anyhow::Result<()>
where
    E: Embedding + Clone,
{
    let loader = TextLoader::new().with_metadata(cli.metadata);
    let document = loader
        .load(&cli.text_file_path)
        .context("loading the source document")?;

    let splitter = RecursiveCharacterTextSplitter::builder()
        .build()
        .context("configuring the splitter")?;
    let chunks = splitter.split_documents(&[document]);
    info!(chunks = chunks.len(), "split source document");

    let builder: IndexBuilder<E, LocalVectorStore> = IndexBuilder::new(embedder.clone(), DB_DIR);
    let store = builder
        .build_or_load(chunks)
        .await
        .context("building or loading the index")?;
    let records = store.len();

    let retriever = Retriever::new(embedder, store, SearchStrategy::Similarity);
    info!(strategy = retriever.strategy().as_str(), records, "retriever ready");

    println!(
        "indexed {} ({records} records) into {DB_DIR}",
        cli.text_file_path.display()
    );
    Ok(())
}
