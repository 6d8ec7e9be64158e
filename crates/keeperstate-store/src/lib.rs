mod error;
mod schema;
mod store;

use std::future::Future;

pub use error::{StoreError, StoreResult};
pub use keeperstate_core::{State, StateRecord, StateRegistry};
pub use schema::{SchemaInitializer, TableSpec};
pub use store::{KeeperStateStore, StoreOptions};

/// Read/write contract for per-partition checkpoints.
pub trait StateProvider: Send + Sync {
    /// Get the checkpoint for a topic partition.
    ///
    /// A partition that was never written yields offsets `0, 0` and
    /// [`State::NONE`]; callers branch on the state, not the offsets.
    fn get_state(
        &self,
        topic: &str,
        partition: i32,
    ) -> impl Future<Output = StoreResult<StateRecord>> + Send;

    /// Save a checkpoint, replacing any previous one for the same key.
    fn set_state(&self, record: &StateRecord) -> impl Future<Output = StoreResult<()>> + Send;
}
