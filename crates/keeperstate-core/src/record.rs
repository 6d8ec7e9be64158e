use serde::Serialize;

use crate::error::Result;
use crate::key::{self, CheckpointKey};
use crate::state::State;

/// The last committed progress for one topic partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateRecord {
    /// Source stream.
    pub topic: String,
    /// Shard of the stream; never negative.
    pub partition: i32,
    /// Lowest offset covered by the checkpoint.
    pub min_offset: i64,
    /// Highest offset covered by the checkpoint.
    pub max_offset: i64,
    /// Processing phase the checkpoint reflects.
    pub state: State,
}

impl StateRecord {
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        min_offset: i64,
        max_offset: i64,
        state: State,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            min_offset,
            max_offset,
            state,
        }
    }

    /// The record returned for a partition that was never checkpointed.
    pub fn none(topic: impl Into<String>, partition: i32) -> Self {
        Self::new(topic, partition, 0, 0, State::NONE)
    }

    /// The storage key for this record.
    pub fn key(&self) -> Result<CheckpointKey> {
        CheckpointKey::new(&self.topic, self.partition)
    }

    /// Check topic and partition constraints.
    pub fn validate(&self) -> Result<()> {
        key::validate(&self.topic, self.partition)
    }
}
