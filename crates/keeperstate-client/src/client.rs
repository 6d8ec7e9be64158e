use std::future::Future;

use keeperstate_config::{ClientVersion, KeeperConfig};

use crate::error::ClientResult;
use crate::result::ResultSet;
use crate::statement::Statement;
use crate::transport::HttpTransport;

/// Trait for ClickHouse client operations.
pub trait KeeperClient: Send + Sync {
    /// Check that the server is reachable and healthy.
    fn ping(&self) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Run a statement that returns no rows (DDL, INSERT).
    fn execute(&self, statement: &Statement) -> impl Future<Output = ClientResult<()>> + Send;

    /// Run a statement and read its rows.
    fn query(&self, statement: &Statement) -> impl Future<Output = ClientResult<ResultSet>> + Send;
}

/// Legacy client path: parameters are inlined as escaped literals and
/// results come back as `TabSeparatedWithNames`.
#[derive(Clone)]
pub struct LegacyClient {
    transport: HttpTransport,
}

impl LegacyClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

impl KeeperClient for LegacyClient {
    fn ping(&self) -> impl Future<Output = ClientResult<bool>> + Send {
        self.transport.ping()
    }

    fn execute(&self, statement: &Statement) -> impl Future<Output = ClientResult<()>> + Send {
        async move {
            let sql = statement.inline()?;
            self.transport.post(&sql, &[]).await?;
            Ok(())
        }
    }

    fn query(&self, statement: &Statement) -> impl Future<Output = ClientResult<ResultSet>> + Send {
        async move {
            let sql = statement.inline()?;
            let body = self
                .transport
                .post(&sql, &[format_param("TabSeparatedWithNames")])
                .await?;
            ResultSet::from_tab_separated(&body)
        }
    }
}

/// Current client path: parameters are bound server-side through
/// `param_<name>` and results come back as `JSONCompact`.
///
/// The server only substitutes parameters in the parsed query, not in
/// `VALUES` row data, so inserts are sent with their row literals inlined.
#[derive(Clone)]
pub struct CurrentClient {
    transport: HttpTransport,
}

impl CurrentClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    fn server_params(statement: &Statement) -> Vec<(String, String)> {
        statement
            .params()
            .iter()
            .map(|(name, value)| (format!("param_{}", name), value.to_wire()))
            .collect()
    }
}

impl KeeperClient for CurrentClient {
    fn ping(&self) -> impl Future<Output = ClientResult<bool>> + Send {
        self.transport.ping()
    }

    fn execute(&self, statement: &Statement) -> impl Future<Output = ClientResult<()>> + Send {
        async move {
            if statement.has_values_clause() {
                let sql = statement.inline()?;
                self.transport.post(&sql, &[]).await?;
            } else {
                let params = Self::server_params(statement);
                self.transport.post(statement.sql(), &params).await?;
            }
            Ok(())
        }
    }

    fn query(&self, statement: &Statement) -> impl Future<Output = ClientResult<ResultSet>> + Send {
        async move {
            let mut params = Self::server_params(statement);
            params.push(format_param("JSONCompact"));
            params.push((
                "output_format_json_quote_64bit_integers".to_string(),
                "0".to_string(),
            ));
            let body = self.transport.post(statement.sql(), &params).await?;
            ResultSet::from_json_compact(&body)
        }
    }
}

fn format_param(format: &str) -> (String, String) {
    ("default_format".to_string(), format.to_string())
}

/// A client for the configured protocol version.
#[derive(Clone)]
pub enum HttpClient {
    Legacy(LegacyClient),
    Current(CurrentClient),
}

impl HttpClient {
    /// Build the client selected by `clickhouse.client_version`.
    pub fn from_config(config: &KeeperConfig) -> ClientResult<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(match config.clickhouse.client_version {
            ClientVersion::V1 => HttpClient::Legacy(LegacyClient::new(transport)),
            ClientVersion::V2 => HttpClient::Current(CurrentClient::new(transport)),
        })
    }

    pub fn version(&self) -> ClientVersion {
        match self {
            HttpClient::Legacy(_) => ClientVersion::V1,
            HttpClient::Current(_) => ClientVersion::V2,
        }
    }
}

impl KeeperClient for HttpClient {
    fn ping(&self) -> impl Future<Output = ClientResult<bool>> + Send {
        async move {
            match self {
                HttpClient::Legacy(c) => c.ping().await,
                HttpClient::Current(c) => c.ping().await,
            }
        }
    }

    fn execute(&self, statement: &Statement) -> impl Future<Output = ClientResult<()>> + Send {
        async move {
            match self {
                HttpClient::Legacy(c) => c.execute(statement).await,
                HttpClient::Current(c) => c.execute(statement).await,
            }
        }
    }

    fn query(&self, statement: &Statement) -> impl Future<Output = ClientResult<ResultSet>> + Send {
        async move {
            match self {
                HttpClient::Legacy(c) => c.query(statement).await,
                HttpClient::Current(c) => c.query(statement).await,
            }
        }
    }
}
