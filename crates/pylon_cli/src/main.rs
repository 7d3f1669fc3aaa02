mod store;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pylon_core::prelude::*;
use pylon_publisher::prelude::*;
use pylon_server::prelude::*;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::AnyStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pylon")]
#[command(about = "Publish a web UI build to an object storage CDN")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Build directory to publish instead of the bundled one
    #[arg(long, env = "PYLON_STATIC_PATH", global = true)]
    static_path: Option<String>,

    /// Seconds to wait for the CDN when reading an upload back
    #[arg(long, default_value_t = 30, global = true)]
    verify_timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single publish pass and print the report
    Publish {
        /// JSON publish configuration
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Serve the admin API, publishing whenever a configuration arrives
    Serve {
        /// Configuration to publish with on startup
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Refuse PUT /config
        #[arg(long)]
        read_only: bool,
    },
    /// Parse and validate a configuration without publishing
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<PublishConfig> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let config = PublishConfig::from_json(&data)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let source = AssetRoot::select(cli.static_path.as_deref(), EmbeddedSource::default());
    let publisher = Publisher::new(source, AnyStore::connect)
        .with_http_client(http_client(Duration::from_secs(cli.verify_timeout)));
    info!(
        source = publisher.source().kind(),
        root = publisher.source().root(),
        "Asset source selected"
    );

    match cli.command {
        Commands::CheckConfig { config } => {
            let config = load_config(&config)?;
            config.validate()?;
            println!("✅ Configuration is valid: {config:?}");
            println!("   Assets would be served from {}", config.cdn_prefix());
            println!("   Files over {} bytes are skipped", config.max_file_size_bytes());
        }
        Commands::Publish { config } => {
            let config = load_config(&config)?;
            println!("🚀 Publishing to bucket '{}'...", config.bucket_name);

            let report = publisher
                .publish(Arc::new(config))
                .await
                .context("publish failed, assets stay on the origin")?;

            for skipped in &report.skipped {
                println!("⏭️  Skipped {}: {}", skipped.path, skipped.reason);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!(
                "✅ Published {} objects, assets served from {}",
                report.published.len(),
                publisher.state().static_prefix()
            );
        }
        Commands::Serve {
            config,
            port,
            read_only,
        } => {
            let handle = publisher.spawn();
            if let Some(path) = config {
                let config = load_config(&path)?;
                handle.update_config(config);
            }

            let server = PylonServer::new(PylonServerConfig {
                accept_config: !read_only,
            });
            let app = server.build(handle);

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Admin API listening on {addr}");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
