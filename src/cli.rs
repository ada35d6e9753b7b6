use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::output::{failure, Acknowledgement};
use crate::pipeline::{Pipeline, PipelineOutcome};

#[derive(Parser)]
#[command(name = "clocbot")]
#[command(author, version, about = "Count lines of source for a repository", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./clocbot.{toml,json,yaml,yml})
    #[arg(short, long, global = true, env = "CLOCBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory clones are written under while they are analyzed
    #[arg(short, long, global = true, env = "CLOCBOT_DATA_ROOT")]
    data_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count lines of source for one or more repositories
    Count {
        /// Repository URLs (http or https)
        #[arg(required = true)]
        repos: Vec<String>,

        /// Seconds the shallow clone may take
        #[arg(long)]
        clone_timeout: Option<u64>,

        /// Seconds the line counter may take
        #[arg(long)]
        analysis_timeout: Option<u64>,
    },

    /// Write the default configuration to a file
    InitConfig {
        #[arg(default_value = "clocbot.toml")]
        path: PathBuf,
    },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(data_root) = &self.data_root {
            config.data_root = Some(data_root.clone());
        }
        Ok(config)
    }

    async fn execute_count(
        &self,
        repos: &[String],
        clone_timeout: Option<u64>,
        analysis_timeout: Option<u64>,
    ) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(secs) = clone_timeout {
            config.fetch.clone_timeout_secs = secs;
        }
        if let Some(secs) = analysis_timeout {
            config.analysis.timeout_secs = secs;
        }

        let pipeline = Arc::new(Pipeline::from_config(&config)?);
        info!("Cloning under: {}", pipeline.data_root().display());

        let ack = Acknowledgement::start(repos.len());
        let batch = futures::future::join_all(repos.iter().map(|repo| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run(repo).await }
        }));

        let Some(outcomes) = until_interrupted(batch, ctrl_c()).await else {
            ack.interrupted();
            anyhow::bail!("Interrupted before all repositories were counted");
        };

        let succeeded = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, PipelineOutcome::Success { .. }))
            .count();
        ack.finish(succeeded, outcomes.len());

        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                PipelineOutcome::Success { rendered } => println!("{rendered}"),
                PipelineOutcome::Failure {
                    user_message,
                    error: internal,
                } => {
                    error!("Repository #{} failed: {internal:#}", index + 1);
                    eprintln!("{}", failure(format!("#{}: {user_message}", index + 1)));
                }
            }
        }

        let failed = repos.len() - succeeded;
        if failed > 0 {
            anyhow::bail!("{failed} of {} repositories could not be counted", repos.len());
        }

        Ok(())
    }

    fn execute_init_config(&self, path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
        }

        let config = Config {
            data_root: self.data_root.clone(),
            ..Config::default()
        };
        config.save(path)?;
        info!("Configuration written to: {}", path.display());

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Count {
                repos,
                clone_timeout,
                analysis_timeout,
            } => {
                self.execute_count(repos, *clone_timeout, *analysis_timeout)
                    .await
            }
            Commands::InitConfig { path } => self.execute_init_config(path),
        }
    }
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {error}");
        std::future::pending::<()>().await;
    }
}

/// Runs `batch` unless `interrupt` resolves first.
///
/// On interruption the batch future is dropped, which drops every
/// [`CloneGuard`](crate::pipeline::CloneGuard) and kills every subprocess
/// it owns.
async fn until_interrupted<T>(
    batch: impl Future<Output = T>,
    interrupt: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        output = batch => Some(output),
        () = interrupt => {
            info!("Interrupted, dropping in-flight runs");
            None
        }
    }
}
