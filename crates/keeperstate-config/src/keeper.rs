use serde::Deserialize;

use keeperstate_core::StateRegistry;

use crate::error::ConfigResult;
use crate::validation::{resolve_env, validate_config};

/// Checkpoint store configuration as parsed from keeperstate.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    /// ClickHouse connection settings.
    pub clickhouse: ClickHouseConfig,
    /// Checkpoint table settings.
    #[serde(default)]
    pub keeper: KeeperMapConfig,
}

impl KeeperConfig {
    /// Parse a config from a TOML string, resolve `${VAR}` references and
    /// validate the result.
    pub fn parse(toml_str: &str) -> ConfigResult<Self> {
        let mut config: KeeperConfig = toml::from_str(toml_str)?;

        config.clickhouse.hostname = resolve_env(&config.clickhouse.hostname)?;
        config.clickhouse.database = resolve_env(&config.clickhouse.database)?;
        config.clickhouse.username = resolve_env(&config.clickhouse.username)?;
        config.clickhouse.password = resolve_env(&config.clickhouse.password)?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Base URL of the ClickHouse HTTP interface.
    pub fn endpoint(&self) -> String {
        let scheme = if self.clickhouse.ssl { "https" } else { "http" };
        format!(
            "{}://{}:{}",
            scheme, self.clickhouse.hostname, self.clickhouse.port
        )
    }

    /// The state vocabulary: `NONE` plus the configured tags.
    pub fn registry(&self) -> ConfigResult<StateRegistry> {
        Ok(StateRegistry::with_tags(self.keeper.states.iter().cloned())?)
    }
}

/// ClickHouse connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClickHouseConfig {
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_ssl")]
    pub ssl: bool,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Which client path talks to the server.
    #[serde(default)]
    pub client_version: ClientVersion,
}

/// Client protocol selector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ClientVersion {
    /// Literal-inlined statements, TabSeparated results.
    V1,
    /// Server-bound parameters, JSONCompact results.
    #[default]
    V2,
}

/// Checkpoint table settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperMapConfig {
    /// Table holding checkpoint rows.
    #[serde(default = "default_table")]
    pub table: String,
    /// Keeper path backing the KeeperMap engine.
    #[serde(default = "default_path")]
    pub path: String,
    /// Cluster to create the table on. Empty means no ON CLUSTER clause.
    #[serde(default)]
    pub on_cluster: String,
    #[serde(default)]
    pub insert_mode: InsertMode,
    #[serde(default)]
    pub health_check: HealthCheckPolicy,
    /// State tags recognized in addition to NONE.
    #[serde(default = "default_states")]
    pub states: Vec<String>,
}

impl KeeperMapConfig {
    pub fn cluster(&self) -> Option<&str> {
        let cluster = self.on_cluster.trim();
        if cluster.is_empty() {
            None
        } else {
            Some(cluster)
        }
    }
}

impl Default for KeeperMapConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            path: default_path(),
            on_cluster: String::new(),
            insert_mode: InsertMode::default(),
            health_check: HealthCheckPolicy::default(),
            states: default_states(),
        }
    }
}

/// Write acknowledgment mode for checkpoint inserts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Wait for the server to flush any async insert before returning.
    #[default]
    Wait,
    /// Return once the insert is accepted; durability is not confirmed.
    Async,
    /// Force a synchronous insert.
    Sync,
}

/// What to do when the construction-time ping fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheckPolicy {
    /// Refuse to build the store.
    #[default]
    FailFast,
    /// Log the failure and continue.
    LogOnly,
}

fn default_port() -> u16 {
    8443
}

fn default_database() -> String {
    "default".to_string()
}

fn default_username() -> String {
    "default".to_string()
}

fn default_ssl() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_table() -> String {
    "connect_state".to_string()
}

fn default_path() -> String {
    "/kafka-connect".to_string()
}

fn default_states() -> Vec<String> {
    StateRegistry::sink_defaults()
        .tags()
        .filter(|tag| *tag != "NONE")
        .map(str::to_string)
        .collect()
}
