use anyhow::{bail, Context, Result};
use url::Url;

/// Path under which every RedFish resource lives
pub const API_ROOT_PATH: &str = "/redfish/v1/";

/// The service root of a RedFish server, e.g. "https://10.0.0.1/redfish/v1/"
///
/// Users address resources relative to the root ("Systems/1"), while the
/// server hands out absolute identifiers ("/redfish/v1/Systems/1"). Both are
/// funneled through `relative_path` before being joined onto the root.
#[derive(Debug, Clone)]
pub struct ApiRoot {
    base: Url,
}

impl ApiRoot {
    /// Creates the service root for the given scheme and server address
    ///
    /// The address is a host with an optional port, e.g. "10.0.0.1",
    /// "bmc.lab:8443" or "[fe80::1]". Anything carrying a path, query or
    /// userinfo is rejected.
    pub fn new(scheme: &str, server: &str) -> Result<Self> {
        if server.is_empty() {
            bail!("server address is required");
        }

        let base = format!("{}://{}{}", scheme, server, API_ROOT_PATH)
            .parse::<Url>()
            .context("parse server address")?;

        base.host_str().context("server address has no host")?;

        if base.path() != API_ROOT_PATH
            || base.query().is_some()
            || base.fragment().is_some()
            || !base.username().is_empty()
        {
            bail!("server address must be a host with an optional port");
        }

        Ok(Self { base })
    }

    /// Returns the host and port the root points at, for logging
    pub fn authority(&self) -> String {
        match (self.base.host_str(), self.base.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        }
    }

    /// Builds the full URL of a resource
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, relative_path(path))
    }
}

/// Strips the service root prefix from a resource identifier
///
/// "/redfish/v1/Systems/1" and "Systems/1" both come back as "Systems/1".
/// The bare service root ("/redfish/v1") becomes the empty path.
pub fn relative_path(id: &str) -> &str {
    let path = id.trim_start_matches('/');
    let root = API_ROOT_PATH.trim_matches('/');

    match path.strip_prefix(root) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}
