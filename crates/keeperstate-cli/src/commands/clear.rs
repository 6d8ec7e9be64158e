use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use keeperstate_config::KeeperConfig;
use keeperstate_core::StateRecord;
use keeperstate_store::{KeeperStateStore, StateProvider};

pub async fn cmd_clear(config: &KeeperConfig, topic: &str, partition: i32, yes: bool) -> Result<()> {
    let record = StateRecord::none(topic, partition);
    record.validate()?;

    if !yes {
        println!(
            "{}",
            "This resets the checkpoint to NONE with zero offsets.".yellow()
        );
        let confirmed = Confirm::new()
            .with_prompt(format!("Clear checkpoint for topic '{}' partition {}?", topic, partition))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let store = KeeperStateStore::connect(config)
        .await
        .context("Failed to connect to ClickHouse")?;

    store
        .set_state(&record)
        .await
        .with_context(|| format!("Failed to clear checkpoint for {}-{}", topic, partition))?;

    println!("{}", "Checkpoint cleared.".green());
    Ok(())
}
