//! Blob compression and hashing for checkpoint storage

use crate::error::{QuillError, QuillResult};
use sha2::{Digest, Sha256};

/// Compress content using gzip
pub(super) fn compress_content(content: &[u8]) -> QuillResult<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(content)
        .map_err(|e| QuillError::storage(format!("Failed to compress content: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| QuillError::storage(format!("Failed to finish compression: {}", e)))
}

/// Decompress content using gzip
pub(super) fn decompress_content(compressed: &[u8]) -> QuillResult<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| QuillError::storage(format!("Failed to decompress content: {}", e)))?;
    Ok(decompressed)
}

/// SHA-256 of content, hex encoded
pub(crate) fn compute_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_preserves_bytes() {
        let content = "\\section{Intro}\n".repeat(200).into_bytes();
        let compressed = compress_content(&content).unwrap();
        assert!(compressed.len() < content.len());
        assert_eq!(decompress_content(&compressed).unwrap(), content);
    }

    #[test]
    fn test_decompress_garbage_is_storage_error() {
        assert!(matches!(
            decompress_content(b"not gzip"),
            Err(QuillError::Storage { .. })
        ));
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            compute_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(compute_hash(b"a"), compute_hash(b"b"));
    }
}
