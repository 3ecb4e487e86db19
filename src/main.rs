use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use dataset_dashboard::analysis::analyzer_from_config;
use dataset_dashboard::cli::{self, Cli, Commands};
use dataset_dashboard::store::{seed, MetadataStore};
use dataset_dashboard::utils::init_tracing;
use dataset_dashboard::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_tracing(&config.logging)?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Sniff { path } => {
            let result = cli::sniff_file(&path).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Upload {
            path,
            title,
            description,
            server,
        } => {
            let record = cli::upload_file(&server, &path, title, description).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let analyzer = analyzer_from_config(&config.llm)?;
    let seeds = if config.storage.seed_demo_data {
        seed::demo_records()
    } else {
        Vec::new()
    };
    let store = MetadataStore::open(&config.storage.upload_dir, analyzer, seeds).await?;

    // Create shared state
    let state = AppState {
        config: config.clone(),
        store: Arc::new(store),
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
