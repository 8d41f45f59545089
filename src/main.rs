use anyhow::Result;
use clap::Parser;
use thumbforge::application::serve;
use thumbforge::infrastructure::client::ThumbforgeClient;
use thumbforge::presentation::cli::{Cli, Commands, print_json, thumbnails};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before clap parses env vars)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => serve(cmd.into_server_config()).await,
        Commands::Variations(cmd) => thumbnails::print_variations(&cmd),
        Commands::Health => {
            let client = ThumbforgeClient::from_base_url(&cli.api_url)?;
            let health = client.health().await?;
            print_json(&health)
        }
        Commands::Thumbnail(cmd) => {
            let client = ThumbforgeClient::from_base_url(&cli.api_url)?;
            thumbnails::create_thumbnail(&client, cmd).await
        }
        Commands::Thumbnails(cmd) => {
            let client = ThumbforgeClient::from_base_url(&cli.api_url)?;
            thumbnails::create_thumbnails(&client, cmd).await
        }
    }
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if logging cannot be initialized
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Logs go to stderr so client subcommands keep stdout clean for JSON.
    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}
