// Advisory run lock so overlapping runs never touch the store and graph together
use crate::application::error::{PipelineError, PipelineResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive lock on a lock file, released when dropped.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock without waiting; fails with `RunInProgress` if another run holds it
    /// and with `Lock` if the lock file itself cannot be opened.
    pub fn acquire(path: &Path) -> PipelineResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Lock(format!("cannot create directory {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| PipelineError::Lock(format!("cannot open lock file {}: {}", path.display(), e)))?;

        FileExt::try_lock_exclusive(&file).map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                PipelineError::RunInProgress(path.display().to_string())
            } else {
                PipelineError::Lock(format!("cannot lock {}: {}", path.display(), e))
            }
        })?;

        tracing::debug!("Acquired run lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release run lock {}: {}", self.path.display(), e);
        }
    }
}
