mod client;
mod error;
mod mock;
mod result;
mod statement;
mod transport;

pub use client::{CurrentClient, HttpClient, KeeperClient, LegacyClient};
pub use error::{ClientError, ClientResult};
pub use mock::{MockClient, MockRow};
pub use result::{Cell, ResultSet, Row};
pub use statement::{quote_identifier, quote_string, Param, Statement};
pub use transport::HttpTransport;
