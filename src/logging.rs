//! Diagnostics on stderr, kept apart from the JSON written to stdout.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count: warnings only by default, then info,
/// debug for this crate, and finally trace for everything including reqwest.
pub(crate) fn directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,redfish_cli=info",
        2 => "warn,redfish_cli=debug",
        _ => "trace",
    }
}

/// Installs the stderr subscriber. The level comes only from the flag.
pub fn init(verbosity: u8) {
    let stderr = std::io::stderr();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive(verbosity)))
        .with_writer(std::io::stderr)
        .with_ansi(stderr.is_terminal())
        .with_target(false)
        .try_init();
}
