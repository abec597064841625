use std::io::Write;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::{debug, info};

use crate::client::{Fetch, RedfishClient};
use crate::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use crate::error::CliError;
use crate::logging;
use crate::output;
use crate::resolver::MemberResolver;

/// Query a RedFish API and pretty-print the JSON response
#[derive(Parser, Debug)]
#[command(
    name = "redfish-cli",
    disable_help_flag = true,
    after_help = "Flags may be written with one or two dashes, e.g. -ip or --ip."
)]
pub struct Cli {
    /// Server IP address
    #[arg(long = "ip", value_name = "ADDRESS")]
    pub ip: Option<String>,

    /// Authentication user:pass
    #[arg(short = 'u', long = "user", value_name = "USER:PASS")]
    pub user: Option<String>,

    /// RedFish endpoint
    #[arg(short = 'e', long = "endpoint", value_name = "ENDPOINT")]
    pub endpoint: Option<String>,

    /// Display help
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    pub help: bool,

    /// Disable TLS verification
    #[arg(long = "no-tls-check")]
    pub no_tls_check: bool,

    /// Explore and fetch each member of the 'Members' JSON key
    #[arg(long)]
    pub members: bool,

    /// Per-request timeout in seconds, 0 for none
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Maximum number of members fetched at once
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: u16,

    /// Stop fetching members after the first failure
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Print the members that resolved even if others failed
    #[arg(long)]
    pub partial: bool,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

// Names accepted in the single-dash form ("-ip", "-no-tls-check").
const LONG_FLAGS: &[&str] = &[
    "ip",
    "user",
    "endpoint",
    "help",
    "no-tls-check",
    "members",
    "timeout",
    "concurrency",
    "fail-fast",
    "partial",
    "verbose",
];
const LONG_VALUE_FLAGS: &[&str] = &["ip", "user", "endpoint", "timeout", "concurrency"];
const BOOL_FLAGS: &[&str] = &["help", "no-tls-check", "members", "fail-fast", "partial"];
const SHORT_VALUE_FLAGS: &[&str] = &["u", "e"];

pub async fn run(args: impl IntoIterator<Item = String>) -> Result<(), CliError> {
    let cli = parse_args(args)?;
    logging::init(cli.verbose);

    let config = Config::from_cli(&cli)?;
    debug!(?config, "configuration");

    execute(&config, &mut std::io::stdout()).await
}

/// Parses process arguments, treating `-help` as a usage error
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli, CliError> {
    let cli = Cli::try_parse_from(normalize_args(args))
        .map_err(|err| CliError::Usage(err.render().to_string().trim_end().to_string()))?;

    if cli.help {
        return Err(CliError::Usage(usage()));
    }

    Ok(cli)
}

/// Fetches the configured endpoint and writes the result to `out`
///
/// In member mode the response must be a collection; each member is then
/// fetched and the decoded bodies are written as one JSON array.
pub async fn execute<W: Write>(config: &Config, out: &mut W) -> Result<(), CliError> {
    let client = RedfishClient::new(config)?;

    info!(
        server = %config.root.authority(),
        endpoint = %config.endpoint,
        "fetching"
    );
    let body = client.fetch(&config.endpoint).await?;

    if !config.expand_members {
        writeln!(out, "{}", output::format_body(&body)?)?;
        return Ok(());
    }

    let members = output::members_of(&body)?;
    info!(members = members.len(), "expanding members");

    let resolution = MemberResolver::new(client, config.resolver_options())
        .resolve(&members)
        .await;

    match resolution.errors {
        None => {
            writeln!(out, "{}", output::to_pretty_json(&resolution.resources)?)?;
            Ok(())
        }
        Some(errors) => {
            info!(
                failed = errors.len(),
                resolved = resolution.resources.len(),
                "some members could not be resolved"
            );
            if config.emit_partial {
                writeln!(out, "{}", output::to_pretty_json(&resolution.resources)?)?;
            }
            Err(errors.into())
        }
    }
}

fn usage() -> String {
    Cli::command().render_help().to_string().trim_end().to_string()
}

/// Rewrites Go-style flags into the forms clap expects: single-dash long
/// flags ("-ip") get a second dash, boolean flags with an explicit value
/// ("-members=true") collapse to the bare flag or disappear, and the short
/// value flags written long ("--u") lose a dash. Values following a flag are
/// left alone.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized = Vec::new();
    let mut expect_value = false;

    for arg in args {
        if expect_value {
            expect_value = false;
            normalized.push(arg);
            continue;
        }

        let Some(flag) = arg.strip_prefix('-') else {
            normalized.push(arg);
            continue;
        };
        let flag = flag.strip_prefix('-').unwrap_or(flag);

        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };

        if BOOL_FLAGS.contains(&name) {
            match inline_value.map(parse_bool) {
                None | Some(Some(true)) => normalized.push(format!("--{}", name)),
                Some(Some(false)) => {}
                // Leave it for clap to reject.
                Some(None) => normalized.push(format!("--{}", flag)),
            }
        } else if LONG_FLAGS.contains(&name) {
            expect_value = inline_value.is_none() && LONG_VALUE_FLAGS.contains(&name);
            normalized.push(format!("--{}", flag));
        } else if SHORT_VALUE_FLAGS.contains(&name) {
            expect_value = inline_value.is_none();
            normalized.push(format!("-{}", flag));
        } else {
            normalized.push(arg);
        }
    }

    normalized
}

/// Boolean spellings accepted after '=', as Go's flag package does
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
