use std::fmt;

use reqwest::StatusCode;

pub const EXIT_OK: u8 = 0;
pub const EXIT_GENERAL: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_FETCH: u8 = 3;
pub const EXIT_JSON: u8 = 4;

/// Failure of a single GET against the RedFish API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error {}: {}", .0.as_u16(), .0)]
    Status(StatusCode),

    #[error("{}", error_chain(.0))]
    Transport(#[from] reqwest::Error),
}

/// Failure to resolve one entry of a `Members` collection
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    #[error("error processing JSON member #{index}: missing or non-string @odata.id")]
    Malformed { index: usize },

    #[error("error fetching data for {id}: {source}")]
    Fetch {
        index: usize,
        id: String,
        #[source]
        source: FetchError,
    },

    #[error("error decoding JSON for {id}: {source}")]
    Decode {
        index: usize,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("worker for member #{index} panicked")]
    Worker { index: usize },
}

impl MemberError {
    /// Position of the failing entry in the `Members` array
    pub fn index(&self) -> usize {
        match self {
            Self::Malformed { index }
            | Self::Fetch { index, .. }
            | Self::Decode { index, .. }
            | Self::Worker { index } => *index,
        }
    }
}

/// Every per-member failure of one resolution, in `Members` order
#[derive(Debug)]
pub struct AggregatedError(Vec<MemberError>);

impl AggregatedError {
    /// Wraps the collected failures, or returns `None` when there are none
    pub fn from_errors(errors: Vec<MemberError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    #[cfg(test)]
    pub fn errors(&self) -> &[MemberError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errors occurred during processing: [")?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", error)?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for AggregatedError {}

/// Everything that ends a run, each variant carrying its own exit code
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Error fetching data: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error decoding JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Error formatting JSON: {0}")]
    Format(#[source] serde_json::Error),

    #[error("Error: 'Members' key does not correspond to a list in the JSON.")]
    MembersNotList,

    #[error(transparent)]
    Aggregated(#[from] AggregatedError),

    #[error("Error writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0:#}")]
    Setup(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Fetch(_) => EXIT_FETCH,
            Self::Decode(_) | Self::Format(_) => EXIT_JSON,
            Self::MembersNotList | Self::Aggregated(_) | Self::Output(_) | Self::Setup(_) => {
                EXIT_GENERAL
            }
        }
    }
}

// reqwest keeps the interesting part (refused, dns, certificate) in the
// source chain rather than its own message.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
