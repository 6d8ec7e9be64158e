//! ClickHouse KeeperMap-backed checkpoint store.
//!
//! Every read and write is a single round trip. Nothing is cached, batched or
//! retried here; concurrent writers to one key are ordered by the engine.

use std::future::Future;

use keeperstate_client::{HttpClient, KeeperClient, Statement};
use keeperstate_config::{HealthCheckPolicy, InsertMode, KeeperConfig};
use keeperstate_core::{CheckpointKey, StateRecord, StateRegistry};
use tracing::{debug, error, info};

use crate::error::{StoreError, StoreResult};
use crate::schema::{SchemaInitializer, TableSpec};
use crate::StateProvider;

/// Behaviour of a [`KeeperStateStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub table: TableSpec,
    pub insert_mode: InsertMode,
    pub health_check: HealthCheckPolicy,
    /// States accepted on read and write.
    pub registry: StateRegistry,
}

impl StoreOptions {
    pub fn new(table: TableSpec) -> Self {
        Self {
            table,
            insert_mode: InsertMode::default(),
            health_check: HealthCheckPolicy::default(),
            registry: StateRegistry::sink_defaults(),
        }
    }

    pub fn from_config(config: &KeeperConfig) -> StoreResult<Self> {
        let mut table = TableSpec::new(&config.keeper.table, &config.keeper.path);
        if let Some(cluster) = config.keeper.cluster() {
            table = table.with_cluster(cluster);
        }

        Ok(Self {
            table,
            insert_mode: config.keeper.insert_mode,
            health_check: config.keeper.health_check,
            registry: config.registry()?,
        })
    }

    pub fn with_insert_mode(mut self, insert_mode: InsertMode) -> Self {
        self.insert_mode = insert_mode;
        self
    }

    pub fn with_health_check(mut self, health_check: HealthCheckPolicy) -> Self {
        self.health_check = health_check;
        self
    }

    pub fn with_registry(mut self, registry: StateRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// Checkpoint store over a KeeperMap table.
pub struct KeeperStateStore<C> {
    client: C,
    options: StoreOptions,
}

impl KeeperStateStore<HttpClient> {
    /// Connect using the configured client version, check health and
    /// create the checkpoint table if needed.
    pub async fn connect(config: &KeeperConfig) -> StoreResult<Self> {
        info!(
            endpoint = %config.endpoint(),
            database = %config.clickhouse.database,
            username = %config.clickhouse.username,
            client_version = ?config.clickhouse.client_version,
            timeout_ms = config.clickhouse.timeout_ms,
            "Connecting checkpoint store"
        );

        let client = HttpClient::from_config(config)?;
        let options = StoreOptions::from_config(config)?;
        Self::from_client(client, options).await
    }
}

impl<C: KeeperClient> KeeperStateStore<C> {
    /// Create a store from an existing client (for testing or a shared client).
    pub async fn from_client(client: C, options: StoreOptions) -> StoreResult<Self> {
        let store = Self { client, options };
        store.health_check().await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn health_check(&self) -> StoreResult<()> {
        let failure = match self.client.ping().await {
            Ok(true) => None,
            Ok(false) => Some("server did not answer ping".to_string()),
            Err(e) => Some(e.to_string()),
        };

        let Some(reason) = failure else {
            info!("Ping is successful");
            return Ok(());
        };

        match self.options.health_check {
            HealthCheckPolicy::FailFast => Err(StoreError::HealthCheck(reason)),
            HealthCheckPolicy::LogOnly => {
                error!(reason = %reason, "Unable to ping ClickHouse server, continuing");
                Ok(())
            }
        }
    }

    /// Create the checkpoint table if it does not exist.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        SchemaInitializer::new(&self.client, &self.options.table)
            .ensure_schema()
            .await
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn select_statement(&self, key: &CheckpointKey) -> Statement {
        Statement::new(format!(
            "SELECT key, minOffset, maxOffset, state FROM {} WHERE key = {{key:String}}",
            self.options.table.quoted_name()
        ))
        .bind("key", key.as_str())
    }

    fn insert_statement(&self, key: &CheckpointKey, record: &StateRecord) -> Statement {
        let settings = match self.options.insert_mode {
            InsertMode::Wait => "wait_for_async_insert=1",
            InsertMode::Async => "async_insert=1, wait_for_async_insert=0",
            InsertMode::Sync => "async_insert=0",
        };

        Statement::new(format!(
            "INSERT INTO {} SETTINGS {} VALUES \
             ({{key:String}}, {{minOffset:Int64}}, {{maxOffset:Int64}}, {{state:String}})",
            self.options.table.quoted_name(),
            settings
        ))
        .bind("key", key.as_str())
        .bind("minOffset", record.min_offset)
        .bind("maxOffset", record.max_offset)
        .bind("state", record.state.as_str())
    }
}

impl<C: KeeperClient> StateProvider for KeeperStateStore<C> {
    fn get_state(
        &self,
        topic: &str,
        partition: i32,
    ) -> impl Future<Output = StoreResult<StateRecord>> + Send {
        async move {
            let key = CheckpointKey::new(topic, partition)?;
            let result = self.client.query(&self.select_statement(&key)).await?;
            debug!(key = %key, rows = result.len(), "Read checkpoint rows");

            let Some(row) = result.first() else {
                info!(topic, partition, "Read state record with NONE state");
                return Ok(StateRecord::none(topic, partition));
            };

            let min_offset = row.get_i64(1)?;
            let max_offset = row.get_i64(2)?;
            let state = self.options.registry.parse(row.get_string(3)?)?;

            debug!(
                topic,
                partition,
                state = %state,
                min_offset,
                max_offset,
                "Read state record"
            );
            Ok(StateRecord::new(topic, partition, min_offset, max_offset, state))
        }
    }

    fn set_state(&self, record: &StateRecord) -> impl Future<Output = StoreResult<()>> + Send {
        async move {
            let key = record.key()?;
            // Only states this deployment can read back may be written.
            self.options.registry.parse(record.state.as_str())?;

            self.client
                .execute(&self.insert_statement(&key, record))
                .await?;

            info!(
                topic = %record.topic,
                partition = record.partition,
                state = %record.state,
                min_offset = record.min_offset,
                max_offset = record.max_offset,
                "Wrote state record"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeperstate_client::MockClient;
    use keeperstate_core::State;

    fn options() -> StoreOptions {
        StoreOptions::new(TableSpec::new("connect_state", "/kafka-connect"))
    }

    async fn store() -> KeeperStateStore<MockClient> {
        KeeperStateStore::from_client(MockClient::new(), options())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unwritten_key_is_none() {
        let store = store().await;

        let record = store.get_state("orders", 7).await.unwrap();
        assert_eq!(record, StateRecord::none("orders", 7));
        assert!(record.state.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = store().await;
        let record = StateRecord::new("orders", 3, 100, 500, State::NONE);

        store.set_state(&record).await.unwrap();
        assert_eq!(store.get_state("orders", 3).await.unwrap(), record);
        assert_eq!(
            store.client().get_raw("connect_state", "orders-3"),
            Some((100, 500, "NONE".to_string()))
        );
    }

    #[tokio::test]
    async fn test_one_statement_per_call() {
        let store = store().await;
        store.client().clear_statements();

        store.get_state("orders", 1).await.unwrap();
        assert_eq!(store.client().statements().len(), 1);

        store
            .set_state(&StateRecord::none("orders", 1))
            .await
            .unwrap();
        assert_eq!(store.client().statements().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_stored_state_fails() {
        let store = store().await;
        store
            .client()
            .put_raw("connect_state", "orders-2", 1, 2, "EXPLODED");

        let err = store.get_state("orders", 2).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(keeperstate_core::Error::UnknownState(ref s)) if s == "EXPLODED"
        ));
    }

    #[tokio::test]
    async fn test_unregistered_state_not_written() {
        let registry = StateRegistry::sink_defaults();
        let store = KeeperStateStore::from_client(
            MockClient::new(),
            options().with_registry(StateRegistry::new()),
        )
        .await
        .unwrap();

        let record = StateRecord::new("orders", 0, 1, 2, registry.parse("IN_PROCESSING").unwrap());
        assert!(matches!(
            store.set_state(&record).await,
            Err(StoreError::Core(keeperstate_core::Error::UnknownState(_)))
        ));
        assert_eq!(store.client().row_count("connect_state"), 0);
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let store = store().await;
        store.client().clear_statements();

        assert!(matches!(
            store.get_state("", 0).await,
            Err(StoreError::Core(keeperstate_core::Error::EmptyTopic))
        ));
        assert!(matches!(
            store.get_state("orders", -1).await,
            Err(StoreError::Core(keeperstate_core::Error::NegativePartition(-1)))
        ));
        assert!(store.client().statements().is_empty());
    }

    #[tokio::test]
    async fn test_backend_errors_propagate() {
        let store = store().await;
        store.client().set_failure(Some("connection reset".into()));

        assert!(matches!(
            store.get_state("orders", 0).await,
            Err(StoreError::Client(_))
        ));
        assert!(matches!(
            store.set_state(&StateRecord::none("orders", 0)).await,
            Err(StoreError::Client(_))
        ));
    }

    #[tokio::test]
    async fn test_health_check_fail_fast() {
        let result = KeeperStateStore::from_client(MockClient::unreachable(), options()).await;
        assert!(matches!(result, Err(StoreError::HealthCheck(_))));
    }

    #[tokio::test]
    async fn test_health_check_log_only() {
        let client = MockClient::unreachable();
        let store = KeeperStateStore::from_client(
            client.clone(),
            options().with_health_check(HealthCheckPolicy::LogOnly),
        )
        .await
        .unwrap();

        assert!(client.table_exists("connect_state"));
        assert!(store.get_state("orders", 0).await.unwrap().state.is_none());
    }

    #[test]
    fn test_insert_settings_by_mode() {
        let client = MockClient::new();
        let key = CheckpointKey::new("orders", 3).unwrap();
        let record = StateRecord::new("orders", 3, 100, 500, State::NONE);

        let sql_for = |mode: InsertMode| {
            let store = KeeperStateStore {
                client: client.clone(),
                options: options().with_insert_mode(mode),
            };
            store.insert_statement(&key, &record).inline().unwrap()
        };

        assert_eq!(
            sql_for(InsertMode::Wait),
            "INSERT INTO `connect_state` SETTINGS wait_for_async_insert=1 \
             VALUES ('orders-3', 100, 500, 'NONE')"
        );
        assert!(sql_for(InsertMode::Async)
            .contains("SETTINGS async_insert=1, wait_for_async_insert=0 VALUES"));
        assert!(sql_for(InsertMode::Sync).contains("SETTINGS async_insert=0 VALUES"));
    }

    #[test]
    fn test_options_from_config() {
        let config = KeeperConfig::parse(
            r#"
[clickhouse]
hostname = "localhost"

[keeper]
table = "offsets"
path = "/p"
on_cluster = "prod"
insert_mode = "sync"
health_check = "log_only"
states = ["DONE"]
"#,
        )
        .unwrap();

        let options = StoreOptions::from_config(&config).unwrap();
        assert_eq!(
            options.table,
            TableSpec::new("offsets", "/p").with_cluster("prod")
        );
        assert_eq!(options.insert_mode, InsertMode::Sync);
        assert_eq!(options.health_check, HealthCheckPolicy::LogOnly);
        assert!(options.registry.contains("DONE"));
    }
}
