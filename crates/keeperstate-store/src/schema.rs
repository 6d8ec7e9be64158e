//! Checkpoint table creation.

use keeperstate_client::{quote_identifier, quote_string, KeeperClient, Statement};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Where checkpoint rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// Keeper path backing the KeeperMap engine.
    pub keeper_path: String,
    /// Cluster to run the DDL on, for replicated deployments.
    pub cluster: Option<String>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, keeper_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keeper_path: keeper_path.into(),
            cluster: None,
        }
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// The quoted table name for use in statements.
    pub fn quoted_name(&self) -> String {
        quote_identifier(&self.name)
    }
}

/// Creates the checkpoint table if it does not exist.
pub struct SchemaInitializer<'a, C> {
    client: &'a C,
    table: &'a TableSpec,
}

impl<'a, C: KeeperClient> SchemaInitializer<'a, C> {
    pub fn new(client: &'a C, table: &'a TableSpec) -> Self {
        Self { client, table }
    }

    /// The DDL for the checkpoint table.
    pub fn create_table_statement(&self) -> Statement {
        let on_cluster = match &self.table.cluster {
            Some(cluster) => format!(" ON CLUSTER {}", quote_identifier(cluster)),
            None => String::new(),
        };

        Statement::new(format!(
            "CREATE TABLE IF NOT EXISTS {}{} \
             (`key` String, minOffset BIGINT, maxOffset BIGINT, state String) \
             ENGINE=KeeperMap({}) PRIMARY KEY `key`",
            self.table.quoted_name(),
            on_cluster,
            quote_string(&self.table.keeper_path),
        ))
    }

    /// Ensure the checkpoint table exists.
    ///
    /// Safe to run concurrently from many instances: `IF NOT EXISTS` makes a
    /// lost creation race a no-op. Errors are returned as-is, never retried.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        debug!(table = %self.table.name, "Ensuring checkpoint table exists");

        self.client
            .execute(&self.create_table_statement())
            .await
            .map_err(|source| StoreError::Schema {
                table: self.table.name.clone(),
                source,
            })?;

        info!(
            table = %self.table.name,
            keeper_path = %self.table.keeper_path,
            cluster = self.table.cluster.as_deref().unwrap_or(""),
            "Checkpoint table initialized"
        );
        Ok(())
    }
}
