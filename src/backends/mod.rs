pub mod local;

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Errors surfaced by the checksum pipeline.
///
/// `DirectoryRead`, `Spawn` and `ReportWrite` abort a run. `FileHash` is
/// logged by the worker that hit it and turned into a skipped row.
#[derive(Debug)]
pub enum ChecksumError {
    DirectoryRead(PathBuf, io::Error),
    FileHash(PathBuf, io::Error),
    /// Not a single hash worker thread could be started.
    Spawn(io::Error),
    ReportWrite(PathBuf, io::Error),
}

impl fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumError::DirectoryRead(path, e) => {
                write!(f, "Error reading directory {}: {}", path.display(), e)
            }
            ChecksumError::FileHash(path, e) => {
                write!(f, "Error calculating SHA256 for file {}: {}", path.display(), e)
            }
            ChecksumError::Spawn(e) => write!(f, "Error starting hash workers: {}", e),
            ChecksumError::ReportWrite(path, e) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_else(|| path.to_string_lossy());
                write!(f, "Error writing to {}: {}", name, e)
            }
        }
    }
}

impl std::error::Error for ChecksumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChecksumError::DirectoryRead(_, e)
            | ChecksumError::FileHash(_, e)
            | ChecksumError::Spawn(e)
            | ChecksumError::ReportWrite(_, e) => Some(e),
        }
    }
}

/// One entry directly inside a listed directory.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub file_type: fs::FileType,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    /// Base name used for filtering and for the report row.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Where files are listed from, streamed out of, and where the report lands.
pub trait StorageBackend: Send + Sync {
    /// Entries directly inside `path`. Not recursive.
    fn list(&self, path: &Path) -> Result<Vec<FileEntry>, ChecksumError>;
    /// Open `path` for a streaming read. The handle closes when dropped.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
    /// Create or truncate `path` and write `data` verbatim.
    fn put(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

pub use local::LocalBackend;
