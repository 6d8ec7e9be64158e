use anyhow::{Context, Result};
use colored::Colorize;
use keeperstate_config::KeeperConfig;
use keeperstate_core::StateRecord;
use keeperstate_store::{KeeperStateStore, StateProvider};

use super::get::print_record;

pub async fn cmd_set(
    config: &KeeperConfig,
    topic: &str,
    partition: i32,
    min_offset: i64,
    max_offset: i64,
    state: &str,
) -> Result<()> {
    let registry = config.registry()?;
    let state = registry.parse(state).with_context(|| {
        format!(
            "Known states: {}",
            registry.tags().collect::<Vec<_>>().join(", ")
        )
    })?;
    let record = StateRecord::new(topic, partition, min_offset, max_offset, state);
    record.validate()?;

    let store = KeeperStateStore::connect(config)
        .await
        .context("Failed to connect to ClickHouse")?;

    store
        .set_state(&record)
        .await
        .with_context(|| format!("Failed to write checkpoint for {}-{}", topic, partition))?;

    println!("{}", "Checkpoint written.".green());
    print_record(&record);
    Ok(())
}
