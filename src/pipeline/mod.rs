//! Repository analysis pipeline.
//!
//! Validate → probe → shallow clone → count → aggregate and render, with the
//! clone directory removed on every exit path.

mod analyzer;
mod cleanup;
mod endpoint;
mod process;
mod remote;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::info;

pub use analyzer::Analyzer;
pub use cleanup::CloneGuard;
pub use endpoint::Endpoint;
pub use remote::{GitRemote, RepositoryRemote};

use crate::config::Config;
use crate::error::{CommandError, PipelineError, Result};
use crate::output::render_report;
use crate::report::AnalysisReport;

/// Result of one run, split into what the requester may see and what only
/// the operator logs should see.
#[derive(Debug)]
pub enum PipelineOutcome {
    Success {
        rendered: String,
    },
    Failure {
        user_message: String,
        error: PipelineError,
    },
}

impl From<PipelineError> for PipelineOutcome {
    fn from(error: PipelineError) -> Self {
        Self::Failure {
            user_message: error.user_message().to_string(),
            error,
        }
    }
}

/// Everything a run needs, passed in explicitly rather than shared globally.
///
/// Holds no mutable state, so one instance can serve concurrent runs.
pub struct Pipeline {
    remote: Arc<dyn RepositoryRemote>,
    analyzer: Analyzer,
    data_root: PathBuf,
    clone_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        remote: Arc<dyn RepositoryRemote>,
        analyzer: Analyzer,
        data_root: PathBuf,
        clone_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            analyzer,
            data_root,
            clone_timeout,
        }
    }

    /// Builds a pipeline backed by the git executable and smart HTTP probing.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let remote = GitRemote::new(
            config.fetch.git_program.clone(),
            config.fetch.probe_timeout(),
        )
        .context("Failed to create HTTP client for repository probing")?;

        Ok(Self::new(
            Arc::new(remote),
            Analyzer::from_config(&config.analysis),
            config.data_root(),
            config.fetch.clone_timeout(),
        ))
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Counts lines of `repository` and renders the table.
    ///
    /// Never fails outright: every stage error becomes a
    /// [`PipelineOutcome::Failure`].
    pub async fn run(&self, repository: &str) -> PipelineOutcome {
        match self.count_lines(repository).await {
            Ok(rendered) => PipelineOutcome::Success { rendered },
            Err(error) => error.into(),
        }
    }

    async fn count_lines(&self, repository: &str) -> Result<String> {
        let endpoint = Endpoint::parse(repository)?;
        endpoint.ensure_allowed()?;
        let clone_path = endpoint.clone_path(&self.data_root)?;

        self.remote
            .probe(&endpoint)
            .await
            .map_err(PipelineError::RepositoryUnreachable)?;

        let guard = CloneGuard::new(clone_path);
        info!("Cloning {endpoint} into: {}", guard.path().display());

        self.remote
            .shallow_clone(&endpoint, guard.path(), self.clone_timeout)
            .await
            .map_err(|error| match error {
                CommandError::TimedOut { deadline, .. } => PipelineError::FetchTimeout(deadline),
                other => PipelineError::FetchFailed(other),
            })?;

        let languages = self.analyzer.analyze(guard.path()).await?;
        let report = AnalysisReport::new(languages);

        Ok(render_report(&report, &endpoint.to_string()))
    }
}
