use std::io::BufReader;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::io::SyncIoBridge;

use crate::config::AnalysisConfig;
use crate::error::{CommandError, PipelineError, Result};
use crate::report::LanguageStat;

use super::process::{capture, program_name, terminate};

/// Runs the external line counter against a checked out tree.
#[derive(Debug, Clone)]
pub struct Analyzer {
    program: String,
    args: Vec<String>,
    deadline: Duration,
}

impl Analyzer {
    pub fn new(program: String, args: Vec<String>, deadline: Duration) -> Self {
        Self {
            program,
            args,
            deadline,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone(), config.timeout())
    }

    fn command(&self, tree: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("-f")
            .arg("json")
            .arg(tree)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Counts lines under `tree`, one [`LanguageStat`] per language in the
    /// order the tool printed them.
    ///
    /// Whatever goes wrong, the subprocess has been killed and reaped by the
    /// time this returns.
    pub async fn analyze(&self, tree: &Path) -> Result<Vec<LanguageStat>> {
        let mut command = self.command(tree);
        let program = program_name(&command);

        let mut child = command.spawn().map_err(|source| {
            PipelineError::AnalysisFailed(CommandError::Spawn {
                program: program.clone(),
                source,
            })
        })?;
        debug!("{program} subprocess started (pid {:?})", child.id());

        let stderr = capture(child.stderr.take());
        let Some(stdout) = child.stdout.take() else {
            terminate(&mut child, &program).await;
            return Err(PipelineError::AnalysisFailed(CommandError::MissingPipe {
                program,
                stream: "stdout",
            }));
        };

        let outcome = timeout(
            self.deadline,
            decode_then_wait(&mut child, &program, stdout, stderr),
        )
        .await;

        match outcome {
            Ok(Ok(languages)) => {
                info!("{program} reported {} languages", languages.len());
                Ok(languages)
            }
            Ok(Err(error)) => {
                terminate(&mut child, &program).await;
                Err(error)
            }
            Err(_) => {
                terminate(&mut child, &program).await;
                Err(PipelineError::AnalysisTimeout(self.deadline))
            }
        }
    }
}

/// Streams stdout through the JSON decoder, then checks the exit status.
async fn decode_then_wait(
    child: &mut Child,
    program: &str,
    stdout: ChildStdout,
    stderr: JoinHandle<String>,
) -> Result<Vec<LanguageStat>> {
    let reader = BufReader::new(SyncIoBridge::new(stdout));
    let decoded = tokio::task::spawn_blocking(move || {
        serde_json::from_reader::<_, Option<Vec<LanguageStat>>>(reader)
    })
    .await
    .map_err(|join_error| {
        PipelineError::AnalysisFailed(CommandError::Wait {
            program: program.to_string(),
            source: std::io::Error::other(join_error),
        })
    })?;

    let languages = decoded
        .map_err(PipelineError::AnalysisDecodeFailed)?
        .unwrap_or_default();

    let status = child.wait().await.map_err(|source| {
        PipelineError::AnalysisFailed(CommandError::Wait {
            program: program.to_string(),
            source,
        })
    })?;

    if !status.success() {
        return Err(PipelineError::AnalysisFailed(CommandError::Exit {
            program: program.to_string(),
            status,
            stderr: stderr.await.unwrap_or_default(),
        }));
    }

    Ok(languages)
}
