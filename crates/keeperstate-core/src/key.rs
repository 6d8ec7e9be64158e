//! Checkpoint key formatting.
//!
//! Keys are `"{topic}-{partition}"`, the format existing KeeperMap tables use.
//! The partition renders as plain decimal digits, so a key always splits
//! uniquely at its last `-` even when the topic itself contains `-<digits>`.

use std::fmt;

use crate::error::{Error, Result};

const SEPARATOR: char = '-';

/// The primary key of a checkpoint row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey(String);

impl CheckpointKey {
    /// Build the key for a topic partition.
    pub fn new(topic: &str, partition: i32) -> Result<Self> {
        validate(topic, partition)?;
        Ok(Self(format!("{}{}{}", topic, SEPARATOR, partition)))
    }

    /// Split a stored key back into `(topic, partition)`.
    pub fn parse(key: &str) -> Result<(String, i32)> {
        let (topic, partition) = key
            .rsplit_once(SEPARATOR)
            .ok_or_else(|| Error::InvalidKey(key.to_string()))?;

        if partition.is_empty() || !partition.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidKey(key.to_string()));
        }
        let partition: i32 = partition
            .parse()
            .map_err(|_| Error::InvalidKey(key.to_string()))?;

        validate(topic, partition).map_err(|_| Error::InvalidKey(key.to_string()))?;
        Ok((topic.to_string(), partition))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check the inputs every checkpoint operation requires.
pub fn validate(topic: &str, partition: i32) -> Result<()> {
    if topic.is_empty() {
        return Err(Error::EmptyTopic);
    }
    if partition < 0 {
        return Err(Error::NegativePartition(partition));
    }
    Ok(())
}
