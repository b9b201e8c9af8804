//! Single-pass content hashing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use repotidy_core::ContentHash;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Read a file once, returning its byte count and BLAKE3 hash.
///
/// The size is what was actually read, so it always agrees with the hash
/// even if the file changed after it was stat'ed.
pub fn hash_file(path: &Path) -> std::io::Result<(u64, ContentHash)> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut size = 0u64;

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok((size, ContentHash::new(*hasher.finalize().as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("file1.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file2.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file3.txt"), "unique content").unwrap();

        let (size1, hash1) = hash_file(&root.join("file1.txt")).unwrap();
        let (_, hash2) = hash_file(&root.join("file2.txt")).unwrap();
        let (_, hash3) = hash_file(&root.join("file3.txt")).unwrap();

        assert_eq!(size1, 22);
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_hash_spans_buffer_boundary() {
        let temp = TempDir::new().unwrap();
        let data = vec![0x5au8; READ_BUFFER_SIZE * 2 + 17];
        fs::write(temp.path().join("big.bin"), &data).unwrap();

        let (size, hash) = hash_file(&temp.path().join("big.bin")).unwrap();
        assert_eq!(size, data.len() as u64);
        assert_eq!(hash, ContentHash::new(*blake3::hash(&data).as_bytes()));
    }

    #[test]
    fn test_hash_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(hash_file(&temp.path().join("nope")).is_err());
    }
}
