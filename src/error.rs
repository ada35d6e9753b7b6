use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single pipeline run.
///
/// The `Display` output is operator-facing and may contain paths and
/// subprocess stderr. Use [`PipelineError::user_message`] for anything shown
/// to the requester.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("malformed repository URL: {0}")]
    MalformedUrl(String),

    #[error("protocol '{0}' is not allowed, only http and https are accepted")]
    DisallowedProtocol(String),

    #[error("repository is unreachable: {0}")]
    RepositoryUnreachable(#[source] ProbeError),

    #[error("clone did not finish within {}s", .0.as_secs())]
    FetchTimeout(Duration),

    #[error("clone failed: {0}")]
    FetchFailed(#[source] CommandError),

    #[error("analysis did not finish within {}s", .0.as_secs())]
    AnalysisTimeout(Duration),

    #[error("analysis failed: {0}")]
    AnalysisFailed(#[source] CommandError),

    #[error("failed to decode analysis output: {0}")]
    AnalysisDecodeFailed(#[source] serde_json::Error),

    #[error("failed to clean up '{}': {source}", .path.display())]
    CleanupFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Short message that is safe to deliver to whoever asked for the count.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedUrl(_) => "Invalid repository URL",
            Self::DisallowedProtocol(_) => "Only http and https repositories are allowed",
            Self::RepositoryUnreachable(_) => "Repository does not exist or is not reachable",
            Self::FetchTimeout(_) => "Took too long to clone the repo",
            Self::AnalysisTimeout(_) => "Took too long to count the lines",
            Self::FetchFailed(_)
            | Self::AnalysisFailed(_)
            | Self::AnalysisDecodeFailed(_)
            | Self::CleanupFailed { .. } => "Something went wrong, my bad...",
        }
    }
}

/// Reasons the existence probe rejected an endpoint.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} does not advertise git-upload-pack (content type '{content_type}')")]
    NotARepository { url: String, content_type: String },
}

/// Failures of an external subprocess (git or the line counter).
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' did not provide a {stream} pipe")]
    MissingPipe {
        program: String,
        stream: &'static str,
    },

    #[error("failed waiting on '{program}': {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("'{program}' was killed after {}s", .deadline.as_secs())]
    TimedOut { program: String, deadline: Duration },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
