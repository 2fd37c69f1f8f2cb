//! Member digest engine: MD4 over header and data bytes.
//!
//! Every member footer stores two digests, one over the exact raw header
//! record (terminator bytes included) and one over the exact data bytes
//! (padding byte excluded). The two run through independent accumulators
//! and are stored as 32-character lowercase hex, which is also the form
//! they are compared in on verify: byte-for-byte, never re-parsed.

pub use md4::{Digest, Md4};

/// Width of one digest field as stored on disk: 16 MD4 bytes as hex.
pub const DIGEST_HEX_LEN: usize = 32;

/// Render a finalized accumulator as the fixed-width lowercase hex field
/// stored on disk.
pub fn finish_hex(hasher: Md4) -> [u8; DIGEST_HEX_LEN] {
    let raw = hasher.finalize();
    let mut out = [0u8; DIGEST_HEX_LEN];
    hex::encode_to_slice(raw, &mut out).expect("hex output is exactly twice the digest width");
    out
}

/// One-shot digest of a complete byte slice.
pub fn hex_of(bytes: &[u8]) -> [u8; DIGEST_HEX_LEN] {
    let mut hasher = Md4::new();
    hasher.update(bytes);
    finish_hex(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_str(bytes: &[u8; DIGEST_HEX_LEN]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn rfc1320_vectors() {
        assert_eq!(hex_str(&hex_of(b"")), "31d6cfe0d16ae931b73c59d7e0c089c0");
        assert_eq!(hex_str(&hex_of(b"abc")), "a448017aaf21d8525fc10ae87aa6729d");
        assert_eq!(
            hex_str(&hex_of(b"message digest")),
            "d9130a8164549fe818874806e1c7014b"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Md4::new();
        hasher.update(b"mess");
        hasher.update(b"age ");
        hasher.update(b"digest");
        assert_eq!(finish_hex(hasher), hex_of(b"message digest"));
    }

    #[test]
    fn digests_are_deterministic_and_distinct() {
        assert_eq!(hex_of(b"same"), hex_of(b"same"));
        assert_ne!(hex_of(b"x"), hex_of(b"y"));
    }
}
