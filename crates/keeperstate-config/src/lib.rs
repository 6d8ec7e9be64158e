mod error;
mod keeper;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use keeper::{
    ClickHouseConfig, ClientVersion, HealthCheckPolicy, InsertMode, KeeperConfig, KeeperMapConfig,
};
pub use validation::{resolve_env, validate_config};
