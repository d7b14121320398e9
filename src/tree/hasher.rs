//! Content digests for uploaded files using BLAKE3

use crate::error::StorageError;
use crate::types::Digest;
use blake3::Hasher;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size used when streaming file content into the hasher
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Compute the content digest of a file.
///
/// The file is streamed in 8 KiB chunks so large uploads are never held in
/// memory at once.
pub fn hash_file(file_path: &Path) -> Result<Digest, StorageError> {
    let file = File::open(file_path).map_err(|e| StorageError::io("open", file_path, e))?;
    hash_reader(file).map_err(|e| StorageError::io("read", file_path, e))
}

/// Stream a reader into the hasher. Interrupted reads are retried.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<Digest> {
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(*hasher.finalize().as_bytes())
}

/// Compute content digest for in-memory bytes
pub fn compute_content_hash(content: &[u8]) -> Digest {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Hex form of a digest, for logs and display
pub fn digest_hex(digest: &Digest) -> String {
    hex::encode(digest)
}
