use std::process::ExitCode;

mod cli;
mod client;
mod config;
mod endpoint;
mod error;
mod logging;
mod output;
mod resolver;
#[cfg(test)]
mod test_utils;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::run(std::env::args()).await {
        Ok(()) => ExitCode::from(error::EXIT_OK),
        Err(err) => {
            println!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
