use anyhow::{Context, Result};
use colored::Colorize;
use keeperstate_config::KeeperConfig;
use keeperstate_store::KeeperStateStore;

pub async fn cmd_setup(config: &KeeperConfig) -> Result<()> {
    println!("Setting up checkpoint table...\n");
    println!("  table:       {}", config.keeper.table);
    println!("  keeper path: {}", config.keeper.path);
    if let Some(cluster) = config.keeper.cluster() {
        println!("  cluster:     {}", cluster);
    }
    println!();

    // Connecting creates the table if it does not exist
    let _store = KeeperStateStore::connect(config)
        .await
        .context("Failed to connect to ClickHouse")?;

    println!("{}", "Checkpoint table is ready.".green());
    Ok(())
}
