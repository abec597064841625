use std::{fmt, time::Duration};

use crate::cli::Cli;
use crate::endpoint::ApiRoot;
use crate::error::CliError;
use crate::resolver::ResolverOptions;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: u16 = 16;

const SCHEME: &str = "https";
const MISSING_FLAGS: &str = "Error: Flags -ip, -u, and -e are mandatory.";

/// Everything a single invocation needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct Config {
    pub root: ApiRoot,
    pub credentials: Credentials,
    pub endpoint: String,
    pub tls_skip_verify: bool,
    pub expand_members: bool,

    /// Per-request deadline; `None` waits forever
    pub timeout: Option<Duration>,

    /// Upper bound on member fetches in flight
    pub concurrency: usize,
    pub fail_fast: bool,

    /// Print resolved members even when some of them failed
    pub emit_partial: bool,
}

impl Config {
    /// Validates the parsed flags and builds the configuration
    ///
    /// Nothing here touches the network, so a usage error always comes out
    /// before the first request.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let (Some(server), Some(credentials), Some(endpoint)) = (
            non_empty(&cli.ip),
            non_empty(&cli.user),
            non_empty(&cli.endpoint),
        ) else {
            return Err(CliError::Usage(MISSING_FLAGS.to_string()));
        };

        let root = ApiRoot::new(SCHEME, server).map_err(|err| {
            CliError::Usage(format!("Error: invalid server address '{}': {:#}", server, err))
        })?;

        Ok(Config {
            root,
            credentials: Credentials::parse(credentials)?,
            endpoint: endpoint.to_string(),
            tls_skip_verify: cli.no_tls_check,
            expand_members: cli.members,
            timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
            concurrency: usize::from(cli.concurrency),
            fail_fast: cli.fail_fast,
            emit_partial: cli.partial,
        })
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            concurrency: self.concurrency,
            fail_fast: self.fail_fast,
        }
    }
}

/// Basic-Auth credentials, given on the command line as "user:pass"
///
/// Only the first ':' separates the two, so passwords may contain colons.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, CliError> {
        match input.split_once(':') {
            Some((user, password)) => Ok(Self::new(user, password)),
            None => Err(CliError::Usage(
                "Error: -u must be given as user:pass".to_string(),
            )),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_args;

    fn config_from(args: &[&str]) -> Result<Config, CliError> {
        let mut argv = vec!["redfish-cli".to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        Config::from_cli(&parse_args(argv)?)
    }

    #[test]
    fn builds_config_with_defaults() {
        let config = config_from(&["-ip", "10.0.0.1", "-u", "admin:secret", "-e", "Systems"]).unwrap();

        assert_eq!(config.root.url_for(&config.endpoint), "https://10.0.0.1/redfish/v1/Systems");
        assert_eq!(config.credentials, Credentials::new("admin", "secret"));
        assert!(!config.tls_skip_verify);
        assert!(!config.expand_members);
        assert_eq!(config.timeout, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
        assert_eq!(config.concurrency, usize::from(DEFAULT_CONCURRENCY));
        assert!(!config.fail_fast);
        assert!(!config.emit_partial);
    }

    #[test]
    fn builds_config_with_every_flag() {
        let config = config_from(&[
            "-ip=bmc.lab:8443",
            "-u",
            "admin:pa:ss",
            "-e",
            "/redfish/v1/Chassis",
            "-no-tls-check",
            "-members",
            "-timeout",
            "0",
            "-concurrency",
            "4",
            "-fail-fast",
            "-partial",
        ])
        .unwrap();

        assert_eq!(config.credentials.password(), "pa:ss");
        assert!(config.tls_skip_verify);
        assert!(config.expand_members);
        assert_eq!(config.timeout, None);
        assert_eq!(config.resolver_options().concurrency, 4);
        assert!(config.resolver_options().fail_fast);
        assert!(config.emit_partial);
    }

    #[test]
    fn reject_missing_flags() {
        let error = config_from(&["-ip", "10.0.0.1", "-e", "Systems"]).unwrap_err();
        assert_eq!(error.to_string(), MISSING_FLAGS);
        assert_eq!(error.exit_code(), crate::error::EXIT_USAGE);
    }

    #[test]
    fn reject_empty_flags() {
        let error = config_from(&["-ip", "", "-u", "admin:secret", "-e", "Systems"]).unwrap_err();
        assert_eq!(error.to_string(), MISSING_FLAGS);
    }

    #[test]
    fn reject_credentials_without_separator() {
        let error = config_from(&["-ip", "10.0.0.1", "-u", "admin", "-e", "Systems"]).unwrap_err();
        assert_eq!(error.to_string(), "Error: -u must be given as user:pass");
    }

    #[test]
    fn reject_bad_server_address() {
        let error =
            config_from(&["-ip", "10.0.0.1/x", "-u", "admin:secret", "-e", "Systems"]).unwrap_err();
        assert_eq!(error.exit_code(), crate::error::EXIT_USAGE);
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "secret"));
        assert!(!rendered.contains("secret"));
    }
}
