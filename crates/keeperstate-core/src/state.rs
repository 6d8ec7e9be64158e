//! Symbolic checkpoint states.
//!
//! The store never owns the state vocabulary. It only knows `NONE`; every
//! other tag is defined by the pipeline and registered in a [`StateRegistry`].

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// A symbolic processing state, round-tripped as text.
///
/// Values other than [`State::NONE`] can only be obtained from a
/// [`StateRegistry`], so every `State` in circulation is a known tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct State(Cow<'static, str>);

impl State {
    /// No checkpoint has been written for this key (or it was cleared).
    pub const NONE: State = State(Cow::Borrowed("NONE"));

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        *self == State::NONE
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for State {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The set of state tags a deployment recognizes.
///
/// Always contains `NONE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRegistry {
    tags: BTreeSet<String>,
}

impl StateRegistry {
    /// A registry that only knows `NONE`.
    pub fn new() -> Self {
        let mut tags = BTreeSet::new();
        tags.insert(State::NONE.as_str().to_string());
        Self { tags }
    }

    /// A registry with `NONE` plus the given tags.
    pub fn with_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for tag in tags {
            registry.register(tag)?;
        }
        Ok(registry)
    }

    /// The state vocabulary used by the ClickHouse sink pipeline.
    pub fn sink_defaults() -> Self {
        let mut registry = Self::new();
        for tag in ["BEFORE_PROCESSING", "IN_PROCESSING", "AFTER_PROCESSING"] {
            registry.tags.insert(tag.to_string());
        }
        registry
    }

    /// Add a tag. Registering an existing tag is a no-op.
    pub fn register(&mut self, tag: impl Into<String>) -> Result<()> {
        let tag = tag.into();
        if !is_valid_tag(&tag) {
            return Err(Error::InvalidTag(tag));
        }
        self.tags.insert(tag);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Parse stored text into a known state.
    pub fn parse(&self, text: &str) -> Result<State> {
        if text == State::NONE.as_str() {
            return Ok(State::NONE);
        }
        if self.contains(text) {
            Ok(State(Cow::Owned(text.to_string())))
        } else {
            Err(Error::UnknownState(text.to_string()))
        }
    }

    /// All registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
