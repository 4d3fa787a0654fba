use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory missing or not writable: {0}")]
    DownloadDir(String),
    #[error("unusable filename: {0:?}")]
    BadFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Reduces a suggested filename to its final path component. Filenames come
/// from clients and upstream Content-Disposition headers, so anything
/// directory-like must not survive into the join below.
fn sanitize_filename(raw: &str) -> Result<&str, PersistError> {
    let tail = raw.rsplit(['/', '\\']).next().unwrap_or("");
    if tail.is_empty() || tail == "." || tail == ".." {
        return Err(PersistError::BadFilename(raw.to_string()));
    }
    Ok(tail)
}

/// Ensure the download directory exists and is writable; create if missing.
pub fn ensure_download_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(PersistError::DownloadDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::DownloadDir(e.to_string()))?;
    }
    // Writability probe.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::DownloadDir(e.to_string()))?;
    Ok(())
}

/// Accumulates a download in a temp file inside the target directory, then
/// renames it into place. A writer that is dropped without `persist` leaves
/// nothing behind.
pub struct StreamingFileWriter {
    dir: PathBuf,
    tmp: NamedTempFile,
}

impl StreamingFileWriter {
    pub fn create(dir: &Path) -> Result<Self, PersistError> {
        ensure_download_dir(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            tmp,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        Ok(())
    }

    /// Finalizes the download under `filename`, replacing any existing file.
    /// Only the final path component of `filename` is used; the result never
    /// leaves the writer's directory.
    pub fn persist(mut self, filename: &str) -> Result<PathBuf, PersistError> {
        let filename = sanitize_filename(filename)?;
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        let target = self.dir.join(filename);
        if target.exists() {
            fs::remove_file(&target)?;
        }
        self.tmp
            .persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
