use std::fs;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use tracing::{info, warn};

const ENV_EXAMPLE: &str = r#"# keeperstate environment variables
# Copy this to .env and fill in your values

# ClickHouse host (without scheme or port)
CLICKHOUSE_HOST=your-instance.clickhouse.cloud

# ClickHouse password for the configured user
CLICKHOUSE_PASSWORD=your-password
"#;

const CONFIG_TEMPLATE: &str = r#"# keeperstate configuration
# Secrets are loaded from .env file

[clickhouse]
hostname = "${CLICKHOUSE_HOST}"
port = 8443
database = "default"
username = "default"
password = "${CLICKHOUSE_PASSWORD}"
ssl = true
timeout_ms = 30000
# "V1" inlines parameters, "V2" binds them server-side
client_version = "V2"

[keeper]
table = "connect_state"
path = "/kafka-connect"
# on_cluster = "my_cluster"
# "wait" | "async" | "sync"
insert_mode = "wait"
# "fail_fast" | "log_only"
health_check = "fail_fast"
states = ["BEFORE_PROCESSING", "IN_PROCESSING", "AFTER_PROCESSING"]
"#;

pub fn cmd_init(path: &Path) -> Result<()> {
    info!(path = %path.display(), "Initializing keeperstate project");
    fs::create_dir_all(path)?;

    let env_example_path = path.join(".env.example");
    if !env_example_path.exists() {
        fs::write(&env_example_path, ENV_EXAMPLE)?;
        info!(path = %env_example_path.display(), "Created .env.example");
    }

    let config_path = path.join("keeperstate.toml");
    if !config_path.exists() {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
        info!(path = %config_path.display(), "Created keeperstate.toml");
    } else {
        warn!(path = %config_path.display(), "Config file already exists, skipping");
    }

    println!("\n{}\n", "keeperstate project initialized!".green());
    println!("Next steps:");
    println!("  1. Copy .env.example to .env and fill in your credentials");
    println!("  2. Run: keeperstate ping");
    println!("  3. Run: keeperstate setup\n");

    Ok(())
}
