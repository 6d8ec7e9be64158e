use keeperstate_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("clickhouse error: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Core(#[from] keeperstate_core::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] keeperstate_config::ConfigError),

    #[error("health check failed: {0}")]
    HealthCheck(String),

    #[error("failed to create checkpoint table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: ClientError,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
