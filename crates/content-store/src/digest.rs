//! Streaming content digests.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use clipforge_common::error::ForgeResult;
use sha2::{Digest, Sha256};

/// Read buffer size for digest streaming.
const DIGEST_BUF_BYTES: usize = 1024 * 1024;

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// Streams the file through a fixed-size buffer; the whole file is
/// never resident in memory.
pub fn compute_digest(path: impl AsRef<Path>) -> ForgeResult<String> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; DIGEST_BUF_BYTES];

    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("clipforge_digest_{name}"));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_known_digest() {
        let path = temp_file("known", b"hello world");
        let digest = compute_digest(&path).unwrap();
        assert_eq!(
            digest,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_identical_content_identical_digest() {
        let a = temp_file("same_a", b"frame data frame data");
        let b = temp_file("same_b", b"frame data frame data");
        assert_eq!(compute_digest(&a).unwrap(), compute_digest(&b).unwrap());
        std::fs::remove_file(&a).ok();
        std::fs::remove_file(&b).ok();
    }

    #[test]
    fn test_content_larger_than_buffer() {
        let content = vec![0x5a; DIGEST_BUF_BYTES * 2 + 17];
        let path = temp_file("large", &content);
        let digest = compute_digest(&path).unwrap();
        assert_eq!(digest.len(), 64);
        std::fs::remove_file(&path).ok();
    }
}
