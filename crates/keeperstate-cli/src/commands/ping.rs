use anyhow::{Context, Result};
use colored::Colorize;
use keeperstate_client::{HttpClient, KeeperClient};
use keeperstate_config::KeeperConfig;

pub async fn cmd_ping(config: &KeeperConfig) -> Result<()> {
    let client = HttpClient::from_config(config).context("Failed to build ClickHouse client")?;

    println!(
        "Pinging {} (client {:?})...",
        config.endpoint(),
        client.version()
    );

    match client.ping().await {
        Ok(true) => {
            println!("{}", "ClickHouse is reachable.".green());
            Ok(())
        }
        Ok(false) => anyhow::bail!("ClickHouse answered ping with an unexpected response"),
        Err(e) => Err(e).context("Unable to reach ClickHouse"),
    }
}
