use anyhow::{Context, Result};
use colored::Colorize;
use keeperstate_config::KeeperConfig;
use keeperstate_core::StateRecord;
use keeperstate_store::{KeeperStateStore, StateProvider};

pub async fn cmd_get(config: &KeeperConfig, topic: &str, partition: i32, json: bool) -> Result<()> {
    let store = KeeperStateStore::connect(config)
        .await
        .context("Failed to connect to ClickHouse")?;

    let record = store
        .get_state(topic, partition)
        .await
        .with_context(|| format!("Failed to read checkpoint for {}-{}", topic, partition))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

pub(crate) fn print_record(record: &StateRecord) {
    let state = if record.state.is_none() {
        record.state.to_string().yellow()
    } else {
        record.state.to_string().green()
    };

    println!("\n{:<12} {:>8} {:>15} {:>15}  State", "Topic", "Part.", "Min", "Max");
    println!("{:-<70}", "");
    println!(
        "{:<12} {:>8} {:>15} {:>15}  {}",
        record.topic, record.partition, record.min_offset, record.max_offset, state
    );
    println!();
}
