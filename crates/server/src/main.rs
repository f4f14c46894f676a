use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod sse;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "noodleseed")]
#[command(about = "NoodleSeed MCP server over Server-Sent Events", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "noodleseed.toml")]
    config: PathBuf,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Host to bind to (overrides the config file)
    #[arg(long, env = "HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noodleseed=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting NoodleSeed MCP server");

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    api::serve(config).await?;

    Ok(())
}
