use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::CommandError;

/// Longest stderr excerpt kept in an error.
const STDERR_TAIL_BYTES: usize = 2048;

pub(crate) fn program_name(command: &Command) -> String {
    command.as_std().get_program().to_string_lossy().into_owned()
}

/// Runs `command` to completion, killing it if `deadline` passes first.
///
/// Stdout is discarded and stderr is kept for the error on a nonzero exit.
pub(crate) async fn run_with_deadline(
    mut command: Command,
    deadline: Duration,
) -> Result<(), CommandError> {
    let program = program_name(&command);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| CommandError::Spawn {
        program: program.clone(),
        source,
    })?;
    debug!("Spawned '{program}' (pid {:?})", child.id());

    let stderr = capture(child.stderr.take());

    match timeout(deadline, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(CommandError::Exit {
            program,
            status,
            stderr: stderr.await.unwrap_or_default(),
        }),
        Ok(Err(source)) => {
            terminate(&mut child, &program).await;
            Err(CommandError::Wait { program, source })
        }
        Err(_) => {
            terminate(&mut child, &program).await;
            Err(CommandError::TimedOut { program, deadline })
        }
    }
}

/// Collects a pipe in the background and returns its trimmed tail.
pub(crate) fn capture<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(error) = pipe.read_to_end(&mut buffer).await {
                debug!("Stopped reading subprocess pipe: {error}");
            }
        }
        tail(&String::from_utf8_lossy(&buffer), STDERR_TAIL_BYTES)
    })
}

/// Kills and reaps `child`. A child that already exited is left alone.
pub(crate) async fn terminate(child: &mut Child, program: &str) {
    match child.try_wait() {
        Ok(Some(status)) => debug!("'{program}' already exited with {status}"),
        _ => match child.kill().await {
            Ok(()) => debug!("Killed '{program}'"),
            Err(error) => warn!("Failed to kill '{program}': {error}"),
        },
    }
}

fn tail(text: &str, max_bytes: usize) -> String {
    let text = text.trim();
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
