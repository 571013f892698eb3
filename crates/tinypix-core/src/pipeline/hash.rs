//! BLAKE3 content hashing for collected files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streaming BLAKE3 hash of a file, hex-encoded.
pub fn content_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// True when both files exist and have identical contents.
///
/// Sizes are compared first so differing files are usually rejected without
/// reading them.
pub fn same_content(a: &Path, b: &Path) -> std::io::Result<bool> {
    if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(content_hash(a)? == content_hash(b)?)
}
