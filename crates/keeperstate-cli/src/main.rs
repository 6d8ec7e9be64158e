use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod commands;
mod config;
mod env;

use cli::{Cli, Commands};
use commands::{cmd_clear, cmd_get, cmd_init, cmd_ping, cmd_set, cmd_setup};
use config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; the config may not reference any variables
    let loaded = match cli.env.as_deref() {
        Some(name) => Some(env::require_dotenv(name)?),
        None => env::load_dotenv()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("keeperstate=info".parse()?),
        )
        .init();

    if let Some(path) = loaded {
        info!(path = %path.display(), "Loaded environment file");
    }

    match cli.command {
        Commands::Init { path } => cmd_init(&path),
        Commands::Ping => {
            let config = load_config(&cli.config)?;
            cmd_ping(&config).await
        }
        Commands::Setup => {
            let config = load_config(&cli.config)?;
            cmd_setup(&config).await
        }
        Commands::Get {
            topic,
            partition,
            json,
        } => {
            let config = load_config(&cli.config)?;
            cmd_get(&config, &topic, partition, json).await
        }
        Commands::Set {
            topic,
            partition,
            min,
            max,
            state,
        } => {
            let config = load_config(&cli.config)?;
            cmd_set(&config, &topic, partition, min, max, &state).await
        }
        Commands::Clear {
            topic,
            partition,
            yes,
        } => {
            let config = load_config(&cli.config)?;
            cmd_clear(&config, &topic, partition, yes).await
        }
    }
}
