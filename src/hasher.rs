//! Streaming SHA-256 of a single file.

use crate::backends::{ChecksumError, StorageBackend};
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size: 64 KiB
pub const BUF_SIZE: usize = 64 * 1024;

/// Hash everything `reader` yields and return the digest as lowercase hex.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Open `path` through `backend` and hash its contents.
/// The handle is dropped before returning, on success and on error.
pub fn sha256_file(backend: &dyn StorageBackend, path: &Path) -> Result<String, ChecksumError> {
    let reader = backend
        .open(path)
        .map_err(|e| ChecksumError::FileHash(path.to_path_buf(), e))?;
    sha256_reader(reader).map_err(|e| ChecksumError::FileHash(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let digest = sha256_reader(io::empty()).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn spans_multiple_buffers() {
        let data = vec![b'a'; BUF_SIZE * 2 + 17];
        let streamed = sha256_reader(&data[..]).unwrap();
        assert_eq!(streamed, hex::encode(Sha256::digest(&data)));
    }

    #[test]
    fn read_error_is_returned() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "boom"))
            }
        }
        assert!(sha256_reader(Broken).is_err());
    }
}
