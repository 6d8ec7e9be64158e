use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keeperstate")]
#[command(about = "Inspect and manage partition checkpoints stored in ClickHouse")]
#[command(version)]
pub struct Cli {
    /// Environment to load (loads .env.{ENV} instead of .env)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Path to keeperstate.toml config file
    #[arg(short, long, global = true, default_value = "keeperstate.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a starter keeperstate.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Check that ClickHouse is reachable
    Ping,

    /// Create the checkpoint table if it does not exist
    Setup,

    /// Show the checkpoint for a topic partition
    Get {
        /// Topic name
        topic: String,

        /// Partition number
        partition: i32,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the checkpoint for a topic partition
    Set {
        /// Topic name
        topic: String,

        /// Partition number
        partition: i32,

        /// Lowest committed offset
        #[arg(long)]
        min: i64,

        /// Highest committed offset
        #[arg(long)]
        max: i64,

        /// Processing state tag
        #[arg(long, default_value = "NONE")]
        state: String,
    },

    /// Reset a topic partition to the NONE state
    Clear {
        /// Topic name
        topic: String,

        /// Partition number
        partition: i32,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}
