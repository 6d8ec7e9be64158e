pub mod error;
pub mod key;
pub mod record;
pub mod state;

pub use error::{Error, Result};
pub use key::CheckpointKey;
pub use record::StateRecord;
pub use state::{State, StateRegistry};
