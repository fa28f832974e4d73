//! Digest values and the hash functions that produce them.
//!
//! Both supported algorithms emit 32 bytes, so every digest renders as
//! 64 lowercase hex characters and shards on its first 4.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

/// Number of hex characters used for the shard directory name.
pub const SHARD_LEN: usize = 4;

/// Hash function used to name store entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, the naming used by existing stores.
    #[default]
    Sha256,
    Blake3,
}

impl DigestAlgorithm {
    pub fn hasher(self) -> Hasher {
        match self {
            DigestAlgorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            DigestAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// One-shot digest of an in-memory buffer.
    pub fn digest(self, data: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => write!(f, "sha256"),
            DigestAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            other => Err(format!("unknown digest algorithm '{}'", other)),
        }
    }
}

/// Running hash state for one of the supported algorithms.
#[derive(Clone)]
pub enum Hasher {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    pub fn finalize(self) -> Digest {
        match self {
            Hasher::Sha256(h) => Digest(h.finalize().into()),
            Hasher::Blake3(h) => Digest(*h.finalize().as_bytes()),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Hasher::Sha256(_) => DigestAlgorithm::Sha256,
            Hasher::Blake3(_) => DigestAlgorithm::Blake3,
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hasher").field(&self.algorithm()).finish()
    }
}

/// Fixed-length content digest; its hex form is the name of a store entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string. Uppercase input is accepted, but
    /// store entries are always named in lowercase.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Shard directory name: the first `SHARD_LEN` hex characters.
    pub fn shard(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHARD_LEN);
        hex
    }

    /// True when `name` is exactly this digest's canonical rendering.
    pub fn matches_name(&self, name: &str) -> bool {
        name == self.to_hex()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let digest = DigestAlgorithm::Sha256.digest(b"abc");
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_blake3_matches_reference_crate() {
        let digest = DigestAlgorithm::Blake3.digest(b"abc");
        assert_eq!(digest.as_bytes(), blake3::hash(b"abc").as_bytes());
    }

    #[test]
    fn test_hex_is_lowercase_and_64_chars() {
        for algo in [DigestAlgorithm::Sha256, DigestAlgorithm::Blake3] {
            let hex = algo.digest(b"some content").to_hex();
            assert_eq!(hex.len(), 64);
            assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Digest::from_hex("abcd").is_none());
        assert!(Digest::from_hex(&"z".repeat(64)).is_none());

        let digest = DigestAlgorithm::Sha256.digest(b"x");
        assert_eq!(Digest::from_hex(&digest.to_hex()), Some(digest));
    }

    #[test]
    fn test_shard_is_hex_prefix() {
        let digest = DigestAlgorithm::Sha256.digest(b"shard me");
        let hex = digest.to_hex();
        assert_eq!(digest.shard(), &hex[..4]);
    }

    #[test]
    fn test_matches_name_is_exact() {
        let digest = DigestAlgorithm::Sha256.digest(b"name");
        assert!(digest.matches_name(&digest.to_hex()));
        assert!(!digest.matches_name(&digest.to_hex().to_uppercase()));
        assert!(!digest.matches_name("staging"));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("SHA256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert_eq!("blake3".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Blake3));
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }
}
