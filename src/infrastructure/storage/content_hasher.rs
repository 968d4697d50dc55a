use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

use crate::application::ports::StorageError;
use crate::domain::value_objects::ContentHash;

/// Buffer size for I/O operations. 256KB keeps hashing throughput close to
/// sequential read speed without holding a whole image in memory.
const BUFFER_SIZE: usize = 256 * 1024;

/// SHA-256 digests of assembled uploads.
///
/// The `asm` feature of `sha2` enables hardware acceleration on x86_64 and
/// ARM64. Digests are lower-case hex, 64 characters.
pub struct ContentHasher;

impl ContentHasher {
    /// Stream a file through SHA-256.
    ///
    /// A file that vanished or cannot be opened yields
    /// `StorageError::NotFound` with the path.
    pub async fn hash_file(path: &Path) -> Result<ContentHash, StorageError> {
        let file = File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Self::finish(hasher)
    }

    /// Digest of an in-memory buffer
    pub fn hash_bytes(bytes: &[u8]) -> Result<ContentHash, StorageError> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self::finish(hasher)
    }

    fn finish(hasher: Sha256) -> Result<ContentHash, StorageError> {
        let hash_hex = hex::encode(hasher.finalize());
        ContentHash::from_hex(hash_hex).map_err(|e| StorageError::Internal(e.to_string()))
    }
}
