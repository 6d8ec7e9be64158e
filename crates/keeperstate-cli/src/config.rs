use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use keeperstate_config::KeeperConfig;

/// Read and validate keeperstate.toml, resolving `${VAR}` references.
pub fn load_config(path: &Path) -> Result<KeeperConfig> {
    let content = fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\nHint: run 'keeperstate init' to create one.",
            path.display()
        )
    })?;

    KeeperConfig::parse(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}
