use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use walkdir::WalkDir;

use super::{ChecksumError, FileEntry, StorageBackend};

/// Local filesystem backend implementation
pub struct LocalBackend;

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl StorageBackend for LocalBackend {
    /// Lists a single directory level. Symlinks are not followed, so a link
    /// to a directory is reported as a non-directory entry.
    fn list(&self, path: &Path) -> Result<Vec<FileEntry>, ChecksumError> {
        let meta =
            fs::metadata(path).map_err(|e| ChecksumError::DirectoryRead(path.to_path_buf(), e))?;
        if !meta.is_dir() {
            return Err(ChecksumError::DirectoryRead(
                path.to_path_buf(),
                io::Error::new(io::ErrorKind::Other, "not a directory"),
            ));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let err = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"));
                ChecksumError::DirectoryRead(path.to_path_buf(), err)
            })?;
            entries.push(FileEntry {
                path: entry.path().to_path_buf(),
                file_type: entry.file_type(),
            });
        }
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }

    fn put(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }
}
