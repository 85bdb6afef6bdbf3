use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solace::config::Config;
use solace::models::UserContext;
use solace::services::SupportEngine;

#[derive(Parser)]
#[command(name = "solace")]
#[command(about = "Mental-health support engine: retrieval, routing and structured responses")]
struct Args {
    /// Ingest all supported files from this knowledge folder at startup
    #[arg(long)]
    ingest: Option<PathBuf>,

    /// Answer a single query and exit
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Loading embedding model: {}...", config.embeddings.model);
    let engine = SupportEngine::new(config).await?;

    if let Some(folder) = &args.ingest {
        tracing::info!("Ingesting knowledge folder: {}", folder.display());
        let stats = engine.ingest_folder(folder).await?;
        tracing::info!(
            "Ingested {}/{} files ({} chunks, {} failed)",
            stats.successful,
            stats.total_files,
            stats.total_chunks,
            stats.failed
        );
    }

    if let Some(query) = &args.query {
        let user = UserContext::default();
        let routed = engine.route(query, &user).await;
        println!("{}", routed.response);
        tracing::info!(
            agent = %routed.agent_name,
            confidence = routed.confidence,
            "Turn complete"
        );
    } else {
        let stats = engine.stats();
        tracing::info!(
            "Engine ready: {} chunks indexed in '{}'",
            stats.points_count,
            stats.collection_name
        );
    }

    engine.shutdown();
    Ok(())
}
