pub mod thumbnails;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::application::ServerConfig;
use crate::application::services::BatchSettings;
use crate::domain::thumbnails::BatchMode;
use crate::domain::variations::VARIATION_COUNT;
use crate::infrastructure::image_generator::DEFAULT_IMAGE_MODEL;
use crate::infrastructure::prompt_enhancer::DEFAULT_TEXT_MODEL;
use thumbnails::{ThumbnailCommand, ThumbnailsCommand, VariationsCommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate YouTube thumbnails from a topic or a photo", long_about = None)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "THUMBFORGE_URL",
        default_value = "http://localhost:5000"
    )]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Check that a running server is healthy
    Health,

    /// Generate one thumbnail from a topic
    Thumbnail(ThumbnailCommand),

    /// Generate thumbnail variants from a photo
    Thumbnails(ThumbnailsCommand),

    /// Print the prompt variations used for photo batches (offline)
    Variations(VariationsCommand),
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Public URL prefix for generated image links
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:5000")]
    pub base_url: String,

    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub openai_model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub gemini_model: String,

    /// `parallel` or `sequential`
    #[arg(long, env = "BATCH_MODE", default_value = "parallel")]
    pub batch_mode: BatchMode,

    /// Variants generated per photo (1-3)
    #[arg(long, env = "BATCH_SIZE", default_value_t = VARIATION_COUNT)]
    pub batch_size: usize,
}

impl ServeCommand {
    pub fn into_server_config(self) -> ServerConfig {
        ServerConfig {
            bind_address: SocketAddr::new(self.host, self.port),
            base_url: self.base_url,
            upload_dir: self.upload_dir,
            openai_api_key: self.openai_api_key,
            openai_model: self.openai_model,
            gemini_api_key: self.gemini_api_key,
            gemini_model: self.gemini_model,
            batch: BatchSettings::new(self.batch_mode, self.batch_size),
        }
    }
}

pub fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
