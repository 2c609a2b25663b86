use anyhow::{Context, Result};
use blob_gallery::{
    adapters::inbound::http::router::create_router_with_limit,
    app::{AppBuilder, AppConfig},
    ports::services::GalleryService,
    DEFAULT_CONTAINER_NAME,
};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gallery-server")]
#[command(about = "Image gallery served from a blob storage container", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Storage connection string (memory://, file://<dir>, Azure or S3 settings)
    #[arg(long, env = "STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Container holding the gallery images
    #[arg(long, env = "GALLERY_CONTAINER", default_value = DEFAULT_CONTAINER_NAME)]
    container: String,

    /// Public base URL of this server, used for self-hosted blob links
    #[arg(long, env = "PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Maximum size of one upload request in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = AppConfig::default().max_upload_bytes)]
    max_upload_bytes: usize,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_app_config(&self) -> AppConfig {
        let public_base_url = self
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port));

        AppConfig {
            connection_string: self.connection_string.clone(),
            container: self.container.clone(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = match self.log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "blob_gallery={0},gallery_server={0},tower_http={0}",
                env_filter
            ))
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging()?;

    info!("Starting gallery server");
    info!("Container: {}", cli.container);

    // Build the application
    let config = cli.to_app_config();
    let app_services = AppBuilder::new()
        .with_config(config)
        .build()
        .context("Failed to build application")?;

    // Storage problems are reported per request, the server still starts
    if let Err(e) = app_services.gallery_service.ensure_ready().await {
        warn!(error = %e, "Container is not ready yet");
    }

    // Create the router
    let router = create_router_with_limit(app_services.state(), app_services.max_upload_bytes);

    // Bind to address
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    // Start the server
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "gallery-server",
            "--port",
            "8080",
            "--connection-string",
            "memory://",
            "--container",
            "holiday-photos",
        ]);

        assert_eq!(cli.port, 8080);
        assert_eq!(cli.connection_string.as_deref(), Some("memory://"));
        assert_eq!(cli.container, "holiday-photos");
    }

    #[test]
    fn test_public_base_url_defaults_to_port() {
        let cli = Cli::parse_from(["gallery-server", "--port", "8080"]);

        let config = cli.to_app_config();
        assert_eq!(config.public_base_url, "http://localhost:8080");
    }

    #[test]
    fn test_public_base_url_trailing_slash() {
        let cli = Cli::parse_from([
            "gallery-server",
            "--public-base-url",
            "https://gallery.example.com/",
        ]);

        let config = cli.to_app_config();
        assert_eq!(config.public_base_url, "https://gallery.example.com");
    }
}
