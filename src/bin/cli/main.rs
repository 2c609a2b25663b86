use anyhow::{Context, Result};
use blob_gallery::{
    adapters::inbound::http::resolve_blob_name,
    app::{AppBuilder, AppConfig},
    ports::services::GalleryService,
    DEFAULT_CONTAINER_NAME,
};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gallery-cli")]
#[command(about = "Manage the images of a gallery container", long_about = None)]
struct Cli {
    /// Storage connection string (memory://, file://<dir>, Azure or S3 settings)
    #[arg(long, env = "STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Container holding the gallery images
    #[arg(long, env = "GALLERY_CONTAINER", default_value = DEFAULT_CONTAINER_NAME)]
    container: String,

    /// Public base URL of the gallery server, used for self-hosted blob links
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:3000")]
    public_base_url: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List images with their URLs
    List,

    /// Upload image files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete one image by name or URL
    Delete {
        /// Blob name or blob URL
        name: String,
    },

    /// Delete every image in the container
    DeleteAll,

    /// Create the container and set anonymous blob read access
    Init,
}

impl Cli {
    fn to_app_config(&self) -> AppConfig {
        AppConfig {
            connection_string: self.connection_string.clone(),
            container: self.container.clone(),
            public_base_url: self.public_base_url.trim_end_matches('/').to_string(),
            ..AppConfig::default()
        }
    }

    fn init_logging(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.log_level.to_lowercase()))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

async fn upload_file(service: &impl GalleryService, path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?;

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let descriptor = service
        .upload(file_name, ReaderStream::new(file).boxed())
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;

    Ok(descriptor.url)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    let app_services = AppBuilder::new()
        .with_config(cli.to_app_config())
        .build()
        .context("Failed to build application")?;
    let service = app_services.gallery_service;

    match &cli.command {
        Commands::List => {
            let blobs = service.list().await.context("Failed to list images")?;
            for blob in &blobs {
                println!("{}\t{}", blob.name, blob.url);
            }
            eprintln!("{} image(s)", blobs.len());
        }
        Commands::Upload { files } => {
            for path in files {
                let url = upload_file(&service, path).await?;
                println!("{}", url);
            }
        }
        Commands::Delete { name } => {
            let blob_name = resolve_blob_name(name)
                .with_context(|| format!("Invalid blob name or URL: {}", name))?;
            service
                .delete_one(&blob_name)
                .await
                .with_context(|| format!("Failed to delete {}", blob_name))?;
            println!("Deleted {}", blob_name);
        }
        Commands::DeleteAll => {
            let deleted = service
                .delete_all()
                .await
                .context("Failed to delete images")?;
            println!("Deleted {} image(s)", deleted);
        }
        Commands::Init => {
            service
                .ensure_ready()
                .await
                .context("Failed to prepare container")?;
            println!("Container '{}' is ready", service.container());
        }
    }

    Ok(())
}
