use keeperstate_core::StateRegistry;

use crate::error::{ConfigError, ConfigResult};
use crate::keeper::KeeperConfig;

/// Validate a parsed configuration.
pub fn validate_config(config: &KeeperConfig) -> ConfigResult<()> {
    require("clickhouse.hostname", &config.clickhouse.hostname)?;
    require("keeper.table", &config.keeper.table)?;
    require("keeper.path", &config.keeper.path)?;

    if config.clickhouse.port == 0 {
        return Err(ConfigError::InvalidPort);
    }
    if config.clickhouse.timeout_ms == 0 {
        return Err(ConfigError::InvalidTimeout);
    }

    StateRegistry::with_tags(config.keeper.states.iter().cloned())?;
    Ok(())
}

fn require(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Resolve environment variables in a string.
/// Supports ${VAR_NAME} syntax; an unset variable is an error.
pub fn resolve_env(s: &str) -> ConfigResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| ConfigError::UnterminatedEnv {
            value: s.to_string(),
        })?;

        let name = &after[..end];
        let value = std::env::var(name).map_err(|_| ConfigError::MissingEnv {
            name: name.to_string(),
        })?;
        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}
