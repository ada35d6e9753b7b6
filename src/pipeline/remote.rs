use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::process::Command;

use crate::error::{CommandError, ProbeError};

use super::endpoint::Endpoint;
use super::process::run_with_deadline;

const UPLOAD_PACK_ADVERTISEMENT: &str = "application/x-git-upload-pack-advertisement";

/// Access to remote repositories.
///
/// Injected into the pipeline so runs never reach for a global session.
#[async_trait]
pub trait RepositoryRemote: Send + Sync {
    /// Lists remote references without downloading any content.
    async fn probe(&self, endpoint: &Endpoint) -> Result<(), ProbeError>;

    /// Clones the default branch at depth 1 into `dest`, giving up after
    /// `deadline` with [`CommandError::TimedOut`].
    async fn shallow_clone(
        &self,
        endpoint: &Endpoint,
        dest: &Path,
        deadline: Duration,
    ) -> Result<(), CommandError>;
}

/// Probes over smart HTTP and clones with the git executable.
pub struct GitRemote {
    client: Client,
    git_program: String,
}

impl GitRemote {
    pub fn new(git_program: String, probe_timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("git/2.0 (clocbot/", env!("CARGO_PKG_VERSION"), ")"))
            .timeout(probe_timeout)
            .build()?;

        Ok(Self {
            client,
            git_program,
        })
    }

    fn refs_url(endpoint: &Endpoint) -> String {
        format!(
            "{}/info/refs?service=git-upload-pack",
            endpoint.location().trim_end_matches('/')
        )
    }

    fn clone_command(&self, endpoint: &Endpoint, dest: &Path) -> Command {
        let mut command = Command::new(&self.git_program);
        command
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--single-branch")
            .arg("--no-tags")
            .arg("--quiet")
            .arg("--")
            .arg(endpoint.location())
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0");
        command
    }
}

#[async_trait]
impl RepositoryRemote for GitRemote {
    async fn probe(&self, endpoint: &Endpoint) -> Result<(), ProbeError> {
        let url = format!("{endpoint}/info/refs");
        debug!("Listing references of {endpoint}");

        let response = self
            .client
            .get(Self::refs_url(endpoint))
            .header("Git-Protocol", "version=2")
            .send()
            .await
            .map_err(|source| ProbeError::Request {
                url: url.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !content_type.starts_with(UPLOAD_PACK_ADVERTISEMENT) {
            return Err(ProbeError::NotARepository { url, content_type });
        }

        Ok(())
    }

    async fn shallow_clone(
        &self,
        endpoint: &Endpoint,
        dest: &Path,
        deadline: Duration,
    ) -> Result<(), CommandError> {
        run_with_deadline(self.clone_command(endpoint, dest), deadline).await
    }
}
