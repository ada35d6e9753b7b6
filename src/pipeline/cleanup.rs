use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// Removes a clone directory when dropped.
///
/// Create it before the clone starts: every later return, `?` and panic
/// unwinding then removes whatever was written, partial clones included.
#[derive(Debug)]
pub struct CloneGuard {
    path: PathBuf,
}

impl CloneGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CloneGuard {
    fn drop(&mut self) {
        if let Err(error) = remove_clone(&self.path) {
            warn!("{error}");
        }
    }
}

/// Deletes `path` recursively. A missing path is already clean.
pub fn remove_clone(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!("Cleaned: {}", path.display());
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!("Nothing to clean at: {}", path.display());
            Ok(())
        }
        Err(source) => Err(PipelineError::CleanupFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
