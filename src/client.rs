use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::{
    config::{Config, Credentials},
    endpoint::ApiRoot,
    error::FetchError,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the raw body of one RedFish resource
///
/// `path` is relative to the service root; absolute "/redfish/v1/..."
/// identifiers are accepted too.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Authenticated HTTPS client for a single RedFish service
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RedfishClient {
    client: Client,
    root: ApiRoot,
    credentials: Credentials,
}

impl RedfishClient {
    /// Creates a client from the run configuration
    ///
    /// With `tls_skip_verify` set, certificates are not validated at all,
    /// which is only meant for lab BMCs with self-signed certificates.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("redfish-cli/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.tls_skip_verify)
            .connect_timeout(CONNECT_TIMEOUT);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("build HTTP client")?;

        Ok(Self {
            client,
            root: config.root.clone(),
            credentials: config.credentials.clone(),
        })
    }
}

#[async_trait]
impl Fetch for RedfishClient {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.root.url_for(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .basic_auth(self.credentials.user(), Some(self.credentials.password()))
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(%url, %status, "response");

        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
