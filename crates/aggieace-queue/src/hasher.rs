// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content fingerprints for uploaded documents.
//!
//! The fingerprint is the lowercase hex SHA-256 of the raw bytes, computed by
//! streaming so large uploads never sit in memory whole.

use std::path::Path;

use aggieace_core::{AggieError, Fingerprint};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Fingerprint the file at `path`.
///
/// Any I/O failure is reported as [`AggieError::Hashing`]; the request must
/// not be admitted.
pub async fn fingerprint_file(path: &Path) -> Result<Fingerprint, AggieError> {
    let hashing_err = |source| AggieError::Hashing {
        path: path.display().to_string(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(hashing_err)?;
    fingerprint_reader(file).await.map_err(hashing_err)
}

/// Fingerprint everything readable from `reader`.
pub async fn fingerprint_reader<R>(mut reader: R) -> std::io::Result<Fingerprint>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Fingerprint(hex::encode(hasher.finalize())))
}

/// Fingerprint an in-memory buffer.
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint(hex::encode(Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_digest_of_empty_input() {
        assert_eq!(
            fingerprint_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let fp = fingerprint_bytes(b"syllabus");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[tokio::test]
    async fn streaming_matches_in_memory_digest() {
        // Larger than one chunk so the loop runs more than once.
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = fingerprint_reader(&data[..]).await.unwrap();
        assert_eq!(streamed, fingerprint_bytes(&data));
    }

    #[tokio::test]
    async fn file_name_does_not_affect_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("renamed-copy.pdf");
        tokio::fs::write(&a, b"%PDF-1.7 same body").await.unwrap();
        tokio::fs::write(&b, b"%PDF-1.7 same body").await.unwrap();

        assert_eq!(
            fingerprint_file(&a).await.unwrap(),
            fingerprint_file(&b).await.unwrap()
        );
    }

    #[tokio::test]
    async fn one_byte_difference_changes_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        tokio::fs::write(&a, b"%PDF-1.7 body A").await.unwrap();
        tokio::fs::write(&b, b"%PDF-1.7 body B").await.unwrap();

        assert_ne!(
            fingerprint_file(&a).await.unwrap(),
            fingerprint_file(&b).await.unwrap()
        );
    }

    #[tokio::test]
    async fn missing_file_is_hashing_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = fingerprint_file(&dir.path().join("missing.pdf"))
            .await
            .unwrap_err();
        match err {
            AggieError::Hashing { path, .. } => assert!(path.ends_with("missing.pdf")),
            other => panic!("expected Hashing error, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn equal_bytes_equal_fingerprints(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(fingerprint_bytes(&bytes), fingerprint_bytes(&bytes.clone()));
        }

        #[test]
        fn flipping_a_byte_changes_fingerprint(
            bytes in proptest::collection::vec(any::<u8>(), 1..512),
            idx in any::<prop::sample::Index>(),
        ) {
            let mut changed = bytes.clone();
            let i = idx.index(changed.len());
            changed[i] ^= 0x01;
            prop_assert_ne!(fingerprint_bytes(&bytes), fingerprint_bytes(&changed));
        }
    }
}
