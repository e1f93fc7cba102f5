// src/executors/scratch.rs
//! Scratch files holding one request's source code.
//!
//! Each request gets its own `<uuid>.<ext>` file in the shared scratch
//! directory. Unique names are what keep concurrent requests apart; there is
//! no locking. A `ScratchFile` is removed exactly once, either through
//! `release` or, if the owning future is dropped early, when it is dropped.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::ExecutionError;

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Creates the directory if needed. Safe to call on an existing directory.
    pub fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        log::debug!("Scratch directory ready at {}", root.display());
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes `code` to a freshly named file with the given extension.
    pub async fn acquire(&self, extension: &str, code: &str) -> Result<ScratchFile, ExecutionError> {
        // recreate in case something removed the directory after startup
        fs::create_dir_all(&self.root).await?;

        let path = self
            .root
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        // from here on the guard owns the path, so a failed write still cleans up
        let scratch = ScratchFile {
            path,
            released: false,
        };

        let mut file = fs::File::create(&scratch.path).await?;
        file.write_all(code.as_bytes()).await?;
        file.flush().await?;
        Ok(scratch)
    }
}

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file. Never fails: a removal error is logged and dropped.
    pub async fn release(mut self) {
        if self.released {
            return;
        }
        let outcome = fs::remove_file(&self.path).await;
        self.released = true;
        log_removal(&self.path, outcome);
    }

    // Blocking variant for `Drop`, which cannot await.
    fn remove_blocking(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        log_removal(&self.path, std::fs::remove_file(&self.path));
    }
}

fn log_removal(path: &Path, outcome: std::io::Result<()>) {
    match outcome {
        Ok(()) => log::debug!("Removed scratch file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Scratch file {} already gone", path.display())
        }
        Err(e) => log::warn!("Failed to cleanup scratch file {}: {}", path.display(), e),
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.remove_blocking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_is_idempotent() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("nested").join("scratch");
        ScratchDir::create(&root).unwrap();
        ScratchDir::create(&root).unwrap();
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_acquire_writes_code_with_extension() {
        let tmp = tempdir().unwrap();
        let dir = ScratchDir::create(tmp.path()).unwrap();

        let scratch = dir.acquire("py", "print('hi')\n").await.unwrap();
        assert_eq!(scratch.path().extension().unwrap(), "py");
        assert_eq!(scratch.path().parent().unwrap(), tmp.path());
        let content = std::fs::read_to_string(scratch.path()).unwrap();
        assert_eq!(content, "print('hi')\n");

        let path = scratch.path().to_path_buf();
        scratch.release().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_acquire_uses_unique_names() {
        let tmp = tempdir().unwrap();
        let dir = ScratchDir::create(tmp.path()).unwrap();

        let a = dir.acquire("js", "1").await.unwrap();
        let b = dir.acquire("js", "2").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_drop_removes_unreleased_file() {
        let tmp = tempdir().unwrap();
        let dir = ScratchDir::create(tmp.path()).unwrap();

        let path = {
            let scratch = dir.acquire("py", "pass").await.unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_file() {
        let tmp = tempdir().unwrap();
        let dir = ScratchDir::create(tmp.path()).unwrap();

        let scratch = dir.acquire("py", "pass").await.unwrap();
        std::fs::remove_file(scratch.path()).unwrap();
        scratch.release().await;
    }

    #[tokio::test]
    async fn test_release_leaves_directory_empty() {
        let tmp = tempdir().unwrap();
        let dir = ScratchDir::create(tmp.path()).unwrap();

        let scratch = dir.acquire("js", "1").await.unwrap();
        let path = scratch.path().to_path_buf();
        scratch.release().await;
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_acquire_recreates_missing_directory() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("scratch");
        let dir = ScratchDir::create(&root).unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let scratch = dir.acquire("py", "pass").await.unwrap();
        assert!(scratch.path().exists());
    }
}
