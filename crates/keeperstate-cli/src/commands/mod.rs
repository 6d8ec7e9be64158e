mod clear;
mod get;
mod init;
mod ping;
mod set;
mod setup;

pub use clear::cmd_clear;
pub use get::cmd_get;
pub use init::cmd_init;
pub use ping::cmd_ping;
pub use set::cmd_set;
pub use setup::cmd_setup;
