//! Staging area for temporary on-disk files.
//!
//! Every staged file is represented by a [`StagedFile`] guard that registers
//! its path for release at acquisition time: the owner removes it explicitly
//! on the main paths, and `Drop` removes it on every abandoned path, so no
//! staged file survives its request regardless of where the pipeline exits.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// A directory shared by concurrent uploads for temporary files.
///
/// Callers embed a per-request random token in every file name, so requests
/// never collide on a path and no locking is needed.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the staging root if it does not exist yet.
    pub async fn ensure_root(&self) -> MediaResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Claim a path under the staging root without creating the file.
    ///
    /// The returned guard already owns cleanup, so a tool can be pointed at
    /// the path and any partial output it leaves behind is removed even when
    /// the tool fails.
    pub fn claim(&self, file_name: &str) -> StagedFile {
        StagedFile {
            path: self.root.join(file_name),
            len: 0,
            released: false,
        }
    }

    /// Open a writer that stages an inbound byte stream under `file_name`,
    /// enforcing `max_len` while writing.
    pub async fn create(&self, file_name: &str, max_len: u64) -> MediaResult<StagedFileWriter> {
        self.ensure_root().await?;
        let staged = self.claim(file_name);
        let file = fs::File::create(staged.path()).await?;
        Ok(StagedFileWriter {
            file,
            staged,
            max_len,
        })
    }
}

/// Incremental writer for a staged file.
pub struct StagedFileWriter {
    file: fs::File,
    staged: StagedFile,
    max_len: u64,
}

impl StagedFileWriter {
    /// Append a chunk, rejecting the payload once it exceeds the ceiling.
    ///
    /// On rejection the partially written file is dropped with the guard and
    /// removed.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> MediaResult<()> {
        let next_len = self.staged.len + chunk.len() as u64;
        if next_len > self.max_len {
            return Err(MediaError::TooLarge { limit: self.max_len });
        }
        self.file.write_all(chunk).await?;
        self.staged.len = next_len;
        Ok(())
    }

    /// Flush and hand the finished file to the caller.
    pub async fn finish(mut self) -> MediaResult<StagedFile> {
        self.file.flush().await?;
        debug!(
            path = %self.staged.path().display(),
            len = self.staged.len(),
            "Staged inbound payload"
        );
        Ok(self.staged)
    }
}

/// Exclusively owned temporary file tied to one pipeline stage.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    len: u64,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Re-read the on-disk length (used after an external tool wrote the
    /// file the guard was claimed for).
    pub async fn sync_len(&mut self) -> MediaResult<()> {
        self.len = fs::metadata(&self.path).await?.len();
        Ok(())
    }

    /// Delete the staged file now, consuming the guard.
    ///
    /// A file that never came into existence (claimed path, failed tool) is
    /// not an error.
    pub async fn remove(mut self) -> MediaResult<()> {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e)),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove staged file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_and_finish() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path());

        let mut writer = area.create("raw-abc.mp4", 1024).await.unwrap();
        writer.write_chunk(b"hello ").await.unwrap();
        writer.write_chunk(b"world").await.unwrap();
        let staged = writer.finish().await.unwrap();

        assert_eq!(staged.len(), 11);
        assert_eq!(fs::read(staged.path()).await.unwrap(), b"hello world");

        staged.remove().await.unwrap();
        assert!(!dir.path().join("raw-abc.mp4").exists());
    }

    #[tokio::test]
    async fn test_ceiling_enforced_while_writing() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path());

        let mut writer = area.create("raw-big.mp4", 8).await.unwrap();
        writer.write_chunk(b"12345").await.unwrap();
        let err = writer.write_chunk(b"67890").await.unwrap_err();
        assert!(matches!(err, MediaError::TooLarge { limit: 8 }));

        // Dropping the writer drops the guard, which removes the partial file
        drop(writer);
        assert!(!dir.path().join("raw-big.mp4").exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path());

        let writer = area.create("raw-drop.mp4", 1024).await.unwrap();
        let staged = writer.finish().await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_claimed_path_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path());

        let claimed = area.claim("fast-never-written.mp4");
        // Neither explicit removal nor drop of a never-created file errors
        claimed.remove().await.unwrap();

        let claimed = area.claim("fast-dropped.mp4");
        drop(claimed);
    }

    #[tokio::test]
    async fn test_sync_len_after_external_write() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path());

        let mut claimed = area.claim("fast-tool.mp4");
        fs::write(claimed.path(), b"remuxed output").await.unwrap();
        claimed.sync_len().await.unwrap();
        assert_eq!(claimed.len(), 14);
    }
}
