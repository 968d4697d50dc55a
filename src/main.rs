use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use image_composer::{
    api::create_router,
    config::{Config, LogFormat},
    ApplicationBuilder,
};

#[derive(Parser)]
#[command(
    name = "image-composer",
    about = "Composes promotional images from uploads, logos and text bars",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// TOML configuration file (defaults to $COMPOSER_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep image records in memory instead of Postgres
    #[arg(long, global = true)]
    in_memory: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server and the background collector
    Serve,

    /// Run every maintenance collector once and exit
    Sweep,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_thread_ids(true).init(),
    }
}

async fn builder_for(config: Config, in_memory: bool) -> anyhow::Result<ApplicationBuilder> {
    let builder = ApplicationBuilder::new(config);
    let builder = if in_memory {
        builder.with_in_memory_repository()
    } else {
        builder
            .with_database()
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("database setup failed")?
    };
    builder
        .with_infrastructure()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("infrastructure setup failed")
}

async fn serve(builder: ApplicationBuilder) -> anyhow::Result<()> {
    let gc = builder.build_gc().map_err(|e| anyhow::anyhow!(e))?;
    let state = builder.build().map_err(|e| anyhow::anyhow!(e))?;

    tokio::spawn(Arc::clone(&gc).run());
    info!("Garbage collector started");

    let app = create_router(state);

    let listen_addr = builder.config().listen_addr.clone();
    info!("Listening on {}", listen_addr);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("cannot bind {}", listen_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn sweep(builder: ApplicationBuilder) -> anyhow::Result<()> {
    let gc = builder.build_gc().map_err(|e| anyhow::anyhow!(e))?;
    let result = gc.sweep().await.context("sweep failed")?;
    info!(
        deleted = result.total_deleted,
        errors = result.errors.len(),
        "{}",
        result.summary()
    );
    if !result.is_success() {
        anyhow::bail!("sweep finished with {} errors", result.errors.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("configuration error")?;
    init_tracing(config.log_format);

    info!("Starting image composer");

    let builder = builder_for(config, cli.in_memory).await?;
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(builder).await,
        Command::Sweep => sweep(builder).await,
    }
}
