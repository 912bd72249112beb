use std::fmt;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::{Result, StoreError};

/// Closed set of digest algorithms, ordered weakest to strongest by
/// digest length. The variant order is the upgrade hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// Algorithm used when the caller does not pick one.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

impl HashAlgorithm {
    /// All algorithms in hierarchy order.
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes. The hex form is twice this long.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Returns the next stronger algorithm in the hierarchy.
    pub fn upgrade(self) -> Result<HashAlgorithm> {
        let pos = Self::ALL.iter().position(|a| *a == self);
        match pos.and_then(|i| Self::ALL.get(i + 1)) {
            Some(next) => Ok(*next),
            None => Err(StoreError::NoStrongerAlgorithm(self.name().to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(StoreError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Lowercase hex digest of `bytes` under `algorithm`.
pub fn digest_hex(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
        HashAlgorithm::Sha224 => hex::encode(Sha224::digest(bytes)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        HashAlgorithm::Sha384 => hex::encode(Sha384::digest(bytes)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digests() {
        let input = b"Hello, World!";
        assert_eq!(
            digest_hex(HashAlgorithm::Md5, input),
            "65a8e27d8879283831b664bd8b7f0ad4"
        );
        assert_eq!(
            digest_hex(HashAlgorithm::Sha1, input),
            "0a0a9f2a6772942557ab5355d76af442f8f65e01"
        );
        assert_eq!(
            digest_hex(HashAlgorithm::Sha256, input),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(
            digest_hex(HashAlgorithm::Sha512, input),
            "374d794a95cdcfd8b35993185fef9ba368f160d8daf432d08ba9f1ed1e5abe6c\
             c69291e0fa2fe0006a52570ef18c19def4e617c33ce52ef0a6e5fbe318cb0387"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let a = digest_hex(HashAlgorithm::Sha256, b"abc");
        let b = digest_hex(HashAlgorithm::Sha256, b"abc");
        assert_eq!(a, b);
        assert_eq!(a, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn hex_length_matches_digest_len() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(digest_hex(alg, b"x").len(), alg.digest_len() * 2);
        }
    }

    #[test]
    fn upgrade_walks_the_hierarchy() {
        assert_eq!(HashAlgorithm::Md5.upgrade().unwrap(), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::Sha1.upgrade().unwrap(), HashAlgorithm::Sha224);
        assert_eq!(HashAlgorithm::Sha224.upgrade().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::Sha256.upgrade().unwrap(), HashAlgorithm::Sha384);
        assert_eq!(HashAlgorithm::Sha384.upgrade().unwrap(), HashAlgorithm::Sha512);
        assert!(matches!(
            HashAlgorithm::Sha512.upgrade(),
            Err(StoreError::NoStrongerAlgorithm(_))
        ));
    }

    #[test]
    fn upgrade_strictly_lengthens() {
        for alg in &HashAlgorithm::ALL[..HashAlgorithm::ALL.len() - 1] {
            let up = alg.upgrade().unwrap();
            assert!(up.digest_len() > alg.digest_len());
        }
    }

    #[test]
    fn parse_round_trip() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(alg.name().parse::<HashAlgorithm>().unwrap(), alg);
        }
        assert!(matches!(
            "blake3".parse::<HashAlgorithm>(),
            Err(StoreError::UnknownAlgorithm(_))
        ));
    }
}
