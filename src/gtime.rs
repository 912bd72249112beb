use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config;
use crate::error::{Result, StoreError};
use crate::hashing::HashAlgorithm;

/// Wire format of the ISO field: microsecond precision, trailing Z.
pub(crate) const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Global timestamp in the form `ALG|ISO8601|REGION`. The algorithm
/// field is the algorithm that digested the content of the card this
/// stamp belongs to. The region may not contain `|`; parsing splits on
/// the first two separators only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GTime {
    algorithm: HashAlgorithm,
    timestamp: String,
    region: String,
}

impl GTime {
    /// Stamps the current wall clock for `algorithm`.
    pub fn stamp_now(algorithm: HashAlgorithm) -> GTime {
        GTime {
            algorithm,
            timestamp: Utc::now().format(ISO_FORMAT).to_string(),
            region: config::region_tag(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The ISO-8601 field. Lexicographic order of this field is
    /// chronological order.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Accepts exactly the canonical `YYYY-MM-DDTHH:MM:SS.ffffffZ` form.
    pub fn is_iso_format(value: &str) -> bool {
        NaiveDateTime::parse_from_str(value, ISO_FORMAT).is_ok()
    }

    /// Whether `name` is a member of the closed algorithm set.
    pub fn is_valid_hash_function(name: &str) -> bool {
        name.parse::<HashAlgorithm>().is_ok()
    }
}

impl FromStr for GTime {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.splitn(3, '|');
        let (alg, ts, region) = match (fields.next(), fields.next(), fields.next()) {
            (Some(a), Some(t), Some(r)) => (a, t, r),
            _ => {
                return Err(StoreError::InvalidArgument(format!(
                    "malformed g_time: {s:?}"
                )))
            }
        };
        let algorithm = alg.parse::<HashAlgorithm>()?;
        if !Self::is_iso_format(ts) {
            return Err(StoreError::InvalidArgument(format!(
                "malformed g_time timestamp: {ts:?}"
            )));
        }
        Ok(GTime {
            algorithm,
            timestamp: ts.to_string(),
            region: region.to_string(),
        })
    }
}

impl fmt::Display for GTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.algorithm, self.timestamp, self.region)
    }
}

impl Serialize for GTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_round_trip() {
        let stamp = GTime::stamp_now(HashAlgorithm::Sha256);
        assert_eq!(stamp.algorithm(), HashAlgorithm::Sha256);
        assert!(GTime::is_iso_format(stamp.timestamp()));

        let reparsed: GTime = stamp.to_string().parse().unwrap();
        assert_eq!(reparsed, stamp);
    }

    #[test]
    fn stamp_begins_with_algorithm() {
        for alg in HashAlgorithm::ALL {
            let stamp = GTime::stamp_now(alg).to_string();
            assert!(stamp.starts_with(&format!("{alg}|")));
        }
    }

    #[test]
    fn stamps_are_monotonic_per_algorithm() {
        let first = GTime::stamp_now(HashAlgorithm::Sha256);
        let second = GTime::stamp_now(HashAlgorithm::Sha256);
        assert!(first.timestamp() <= second.timestamp());
    }

    #[test]
    fn parse_splits_on_first_two_separators() {
        let g: GTime = "md5|2023-01-01T12:00:00.000000Z|America/Los_Angeles"
            .parse()
            .unwrap();
        assert_eq!(g.algorithm(), HashAlgorithm::Md5);
        assert_eq!(g.timestamp(), "2023-01-01T12:00:00.000000Z");
        assert_eq!(g.region(), "America/Los_Angeles");
    }

    #[test]
    fn parse_rejects_malformed_inputs() {
        assert!(matches!(
            "sha256|2023-01-01T12:00:00.000000Z".parse::<GTime>(),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            "whirlpool|2023-01-01T12:00:00.000000Z|UTC".parse::<GTime>(),
            Err(StoreError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            "sha256|january first|UTC".parse::<GTime>(),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn iso_format_is_strict() {
        assert!(GTime::is_iso_format("2023-06-15T08:30:00.123456Z"));
        assert!(!GTime::is_iso_format("2023-06-15T08:30:00Z"));
        assert!(!GTime::is_iso_format("2023-06-15 08:30:00.123456"));
        assert!(!GTime::is_iso_format("not a timestamp"));
    }

    #[test]
    fn valid_hash_function_names() {
        assert!(GTime::is_valid_hash_function("sha256"));
        assert!(GTime::is_valid_hash_function("md5"));
        assert!(!GTime::is_valid_hash_function("crc32"));
        assert!(!GTime::is_valid_hash_function(""));
    }
}
