use anyhow::{Context, Result};
use noodleseed_core::Catalog;
use noodleseed_mcp::protocol::ServerInfo;
use noodleseed_mcp::tools::{noodleseed_catalog, WidgetAssets};
use noodleseed_mcp::{SessionOptions, SessionRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const SERVICE_NAME: &str = "noodleseed-mcp-server";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub widgets: WidgetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Path that opens an SSE session
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path that accepts messages for an open session
    #[serde(default = "default_messages_path")]
    pub messages_path: String,

    /// Seconds between keep-alive comments on idle streams
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: usize,
}

fn default_sse_path() -> String {
    "/mcp".to_string()
}

fn default_messages_path() -> String {
    "/mcp/messages".to_string()
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_frame_buffer() -> usize {
    64
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            sse_path: default_sse_path(),
            messages_path: default_messages_path(),
            keep_alive_secs: default_keep_alive_secs(),
            frame_buffer: default_frame_buffer(),
        }
    }
}

impl TransportConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            endpoint: self.messages_path.clone(),
            frame_buffer: self.frame_buffer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_cdn_url")]
    pub cdn_url: String,

    #[serde(default = "default_asset_version")]
    pub asset_version: String,
}

fn default_cdn_url() -> String {
    WidgetAssets::default().cdn_url
}

fn default_asset_version() -> String {
    WidgetAssets::default().asset_version
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            cdn_url: default_cdn_url(),
            asset_version: default_asset_version(),
        }
    }
}

impl ServerConfig {
    /// Load the config file if it exists, otherwise use defaults
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!("Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .context("Failed to read configuration file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse configuration file")?;

        if !config.transport.sse_path.starts_with('/')
            || !config.transport.messages_path.starts_with('/')
        {
            anyhow::bail!("Transport paths must start with '/'");
        }
        if config.transport.sse_path == config.transport.messages_path {
            anyhow::bail!("sse_path and messages_path must differ");
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<Catalog>,
    pub registry: Arc<SessionRegistry>,
    pub server_info: ServerInfo,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let assets = WidgetAssets::new(&config.widgets.cdn_url, &config.widgets.asset_version);
        let catalog = noodleseed_catalog(&assets).context("Failed to build catalog")?;

        tracing::info!("Loaded {} catalog entries", catalog.len());

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            registry: Arc::new(SessionRegistry::new()),
            server_info: ServerInfo::new(SERVICE_NAME, env!("CARGO_PKG_VERSION")),
        })
    }
}
