//! blake3 checksums over vector blobs.

use exprvec_core::errors::{ExprResult, StorageError};

/// Hex-encoded blake3 digest of a blob.
pub fn checksum(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Fail with `Corruption` if `data` no longer matches `expected`.
pub fn verify(table: &str, row: &str, data: &[u8], expected: &str) -> ExprResult<()> {
    let actual = checksum(data);
    if actual != expected {
        return Err(StorageError::Corruption {
            details: format!("{table} {row}: checksum {actual} does not match stored {expected}"),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_flipped_byte() {
        let blob = vec![1u8, 2, 3, 4];
        let sum = checksum(&blob);
        assert!(verify("raw_vectors", "1", &blob, &sum).is_ok());

        let mut tampered = blob.clone();
        tampered[2] ^= 0xff;
        assert!(verify("raw_vectors", "1", &tampered, &sum).is_err());
    }
}
