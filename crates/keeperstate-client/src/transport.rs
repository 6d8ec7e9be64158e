//! Shared HTTP transport for the ClickHouse HTTP interface, with TLS support.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use keeperstate_config::KeeperConfig;
use rustls::ClientConfig;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

const EXCEPTION_CODE_HEADER: &str = "X-ClickHouse-Exception-Code";

/// An HTTP connection to one ClickHouse endpoint.
///
/// `reqwest` owns connection pooling; the transport adds nothing on top.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    database: String,
    username: String,
    password: String,
}

impl HttpTransport {
    /// Build a transport from configuration. Uses rustls with webpki roots
    /// when `ssl` is enabled.
    pub fn from_config(config: &KeeperConfig) -> ClientResult<Self> {
        let timeout = Duration::from_millis(config.clickhouse.timeout_ms);
        let mut builder = reqwest::Client::builder().timeout(timeout);

        if config.clickhouse.ssl {
            builder = builder.use_preconfigured_tls(tls_config()?);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            database: config.clickhouse.database.clone(),
            username: config.clickhouse.username.clone(),
            password: config.clickhouse.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `GET /ping`. Returns whether the server answered `Ok.`.
    pub async fn ping(&self) -> ClientResult<bool> {
        let response = self
            .http
            .get(format!("{}/ping", self.endpoint))
            .send()
            .await?;

        let healthy = response.status().is_success();
        let body = response.bytes().await?;
        Ok(healthy && String::from_utf8_lossy(&body).trim() == "Ok.")
    }

    /// POST a statement. `params` become URL query parameters.
    pub async fn post(&self, sql: &str, params: &[(String, String)]) -> ClientResult<Bytes> {
        debug!(sql, params = params.len(), "Sending ClickHouse statement");

        let response = self
            .http
            .post(format!("{}/", self.endpoint))
            .query(&[("database", self.database.as_str())])
            .query(params)
            .header("X-ClickHouse-User", &self.username)
            .header("X-ClickHouse-Key", &self.password)
            .body(sql.to_string())
            .send()
            .await?;

        let status = response.status();
        let code = response
            .headers()
            .get(EXCEPTION_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());
        let body = response.bytes().await?;

        if !status.is_success() || code.is_some() {
            return Err(ClientError::Server {
                code: code.unwrap_or(0),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        Ok(body)
    }
}

fn tls_config() -> ClientResult<ClientConfig> {
    let mut config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| ClientError::Config(format!("TLS config error: {}", e)))?
            .with_root_certificates(root_certs())
            .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

/// Get root certificates from webpki-roots.
fn root_certs() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}
