use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, ServerConfig};
use staysearch_core::{IdfScheme, IndexConfig, Measure, Morphology};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index snapshot directory written by `indexer build`
    #[arg(long)]
    index: Option<String>,
    /// JSON/JSONL listings used to build at startup (when no snapshot) and on rebuild
    #[arg(long)]
    corpus: Option<String>,
    /// JSON file with an index configuration
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    idf: Option<IdfScheme>,
    #[arg(long)]
    morphology: Option<Morphology>,
    /// Measure used when a request does not name one
    #[arg(long, default_value = "cosine")]
    default_measure: String,
    #[arg(long, default_value_t = 10)]
    default_k: usize,
    #[arg(long, default_value_t = 100)]
    max_k: usize,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut index_config: IndexConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => IndexConfig::default(),
    };
    if let Some(idf) = args.idf {
        index_config.idf = idf;
    }
    if let Some(m) = args.morphology {
        index_config.normalizer.morphology = m;
    }
    let config = ServerConfig {
        corpus: args.corpus,
        index: args.index,
        index_config,
        default_measure: args.default_measure.parse::<Measure>()?,
        default_k: args.default_k,
        max_k: args.max_k,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
