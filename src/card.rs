use serde_json::{json, Value};

use crate::content_type;
use crate::error::{Result, StoreError};
use crate::gtime::GTime;
use crate::hashing::{self, HashAlgorithm, DEFAULT_HASH_ALGORITHM};

/// Input accepted by the card constructor. Everything is normalized to
/// bytes before any other logic sees it.
#[derive(Debug, Clone)]
pub enum CardContent {
    Bytes(Vec<u8>),
    Text(String),
    Object(Value),
}

impl From<Vec<u8>> for CardContent {
    fn from(bytes: Vec<u8>) -> Self {
        CardContent::Bytes(bytes)
    }
}

impl From<&[u8]> for CardContent {
    fn from(bytes: &[u8]) -> Self {
        CardContent::Bytes(bytes.to_vec())
    }
}

impl From<String> for CardContent {
    fn from(text: String) -> Self {
        CardContent::Text(text)
    }
}

impl From<&str> for CardContent {
    fn from(text: &str) -> Self {
        CardContent::Text(text.to_string())
    }
}

impl From<Value> for CardContent {
    fn from(value: Value) -> Self {
        CardContent::Object(value)
    }
}

/// Immutable unit of storage: canonical content bytes, their hex digest
/// under a named algorithm, and a global timestamp carrying the same
/// algorithm. "Update" elsewhere in the crate means replacing the stored
/// row, never editing a card in place.
#[derive(Debug, Clone)]
pub struct Card {
    content_bytes: Vec<u8>,
    hash: String,
    hash_algorithm: HashAlgorithm,
    g_time: GTime,
    content_type: Option<&'static str>,
    textual: bool,
}

impl Card {
    /// Builds a fresh card under the default algorithm.
    pub fn new<C: Into<CardContent>>(content: C) -> Result<Card> {
        Card::with_algorithm(content, DEFAULT_HASH_ALGORITHM)
    }

    /// Builds a fresh card, digesting the normalized content under
    /// `algorithm` and stamping the current wall clock.
    pub fn with_algorithm<C: Into<CardContent>>(
        content: C,
        algorithm: HashAlgorithm,
    ) -> Result<Card> {
        let (content_bytes, textual) = normalize(content.into())?;
        if content_bytes.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        let hash = hashing::digest_hex(algorithm, &content_bytes);
        Ok(Card {
            content_bytes,
            hash,
            hash_algorithm: algorithm,
            g_time: GTime::stamp_now(algorithm),
            content_type: None,
            textual,
        })
    }

    /// Reconstructs a card from a persisted row. The stored `hash` and
    /// `g_time` are authoritative; no re-digestion happens here. A coarse
    /// content type is detected and attached.
    pub fn from_row(content_bytes: Vec<u8>, hash: &str, g_time: &str) -> Result<Card> {
        if hash.is_empty() {
            return Err(StoreError::InvalidArgument("empty hash".to_string()));
        }
        if g_time.is_empty() {
            return Err(StoreError::InvalidArgument("missing g_time".to_string()));
        }
        if content_bytes.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        let g_time: GTime = g_time.parse()?;
        let detected = content_type::detect(&content_bytes);
        Ok(Card {
            hash: hash.to_string(),
            hash_algorithm: g_time.algorithm(),
            g_time,
            content_type: Some(detected),
            textual: false,
            content_bytes,
        })
    }

    pub fn content_bytes(&self) -> &[u8] {
        &self.content_bytes
    }

    /// Decoded text view. Available only for cards constructed from text
    /// or whose detected content type is `text/*`.
    pub fn content_as_text(&self) -> Option<&str> {
        let texty = self.textual
            || self
                .content_type
                .is_some_and(|ct| ct.starts_with("text/"));
        if texty {
            std::str::from_utf8(&self.content_bytes).ok()
        } else {
            None
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn g_time(&self) -> &GTime {
        &self.g_time
    }

    /// Set only on cards reconstructed from persisted rows.
    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    pub fn to_dict(&self) -> Value {
        json!({
            "hash": self.hash,
            "hash_algorithm": self.hash_algorithm.name(),
            "g_time": self.g_time.to_string(),
            "content_type": self.content_type,
            "size_bytes": self.content_bytes.len(),
            "content": self.content_as_text(),
        })
    }

    /// Digest equality, not byte equality. Resolving the rare case where
    /// the two disagree (a collision) is the collection's job.
    pub fn equals(&self, other: &Card) -> bool {
        self.hash == other.hash
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Card {}

fn normalize(content: CardContent) -> Result<(Vec<u8>, bool)> {
    match content {
        CardContent::Bytes(bytes) => Ok((bytes, false)),
        CardContent::Text(text) => Ok((text.into_bytes(), true)),
        CardContent::Object(Value::Null) => {
            Err(StoreError::InvalidContent("null content".to_string()))
        }
        CardContent::Object(value) => {
            if value.as_object().is_some_and(|map| map.is_empty()) {
                return Err(StoreError::InvalidContent("empty object".to_string()));
            }
            // serde_json orders object keys alphabetically, so the byte
            // form is stable across runs.
            Ok((serde_json::to_vec(&value)?, false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_card_under_sha256() {
        let card = Card::with_algorithm("Hello, World!", HashAlgorithm::Sha256).unwrap();
        assert_eq!(card.content_bytes(), b"Hello, World!");
        assert_eq!(
            card.hash(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(card.hash().len(), 64);
        assert_eq!(card.hash_algorithm(), HashAlgorithm::Sha256);
        assert!(card.g_time().to_string().starts_with("sha256|"));
        assert_eq!(card.content_as_text(), Some("Hello, World!"));
    }

    #[test]
    fn object_content_serializes_with_stable_key_order() {
        let card = Card::new(json!({"key": "value"})).unwrap();
        assert_eq!(card.content_bytes(), br#"{"key":"value"}"#);

        let shuffled = Card::new(json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(shuffled.content_bytes(), br#"{"a":1,"b":2}"#);
    }

    #[test]
    fn object_cards_have_no_text_view() {
        // Only text-built cards and reconstructed text/* rows decode;
        // an object-built card exposes bytes only.
        let card = Card::new(json!({"key": "value"})).unwrap();
        assert_eq!(card.content_as_text(), None);
        assert_eq!(card.content_bytes(), br#"{"key":"value"}"#);
    }

    #[test]
    fn empty_object_is_invalid_content() {
        assert!(matches!(
            Card::new(json!({})),
            Err(StoreError::InvalidContent(_))
        ));
    }

    #[test]
    fn null_is_invalid_content() {
        assert!(matches!(
            Card::new(Value::Null),
            Err(StoreError::InvalidContent(_))
        ));
    }

    #[test]
    fn empty_input_is_empty_content() {
        assert!(matches!(Card::new(""), Err(StoreError::EmptyContent)));
        assert!(matches!(
            Card::new(Vec::new()),
            Err(StoreError::EmptyContent)
        ));
    }

    #[test]
    fn same_input_same_digest() {
        let a = Card::with_algorithm(b"payload".as_slice(), HashAlgorithm::Sha1).unwrap();
        let b = Card::with_algorithm(b"payload".as_slice(), HashAlgorithm::Sha1).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash_algorithm(), b.hash_algorithm());
        assert!(a.equals(&b));
    }

    #[test]
    fn timestamp_algorithm_matches_card_algorithm() {
        for alg in HashAlgorithm::ALL {
            let card = Card::with_algorithm("content", alg).unwrap();
            assert_eq!(card.g_time().algorithm(), alg);
        }
    }

    #[test]
    fn from_row_detects_png() {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 13]);
        let card =
            Card::from_row(bytes, "abc", "md5|2023-01-01T12:00:00.000000Z|REGION").unwrap();
        assert_eq!(card.content_type(), Some("image/png"));
        assert_eq!(card.hash_algorithm(), HashAlgorithm::Md5);
        assert_eq!(card.content_as_text(), None);
    }

    #[test]
    fn from_row_trusts_the_stored_hash() {
        let card = Card::from_row(
            b"whatever".to_vec(),
            "not-a-real-digest",
            "sha256|2023-01-01T12:00:00.000000Z|UTC",
        )
        .unwrap();
        assert_eq!(card.hash(), "not-a-real-digest");
    }

    #[test]
    fn from_row_rejects_bad_arguments() {
        assert!(matches!(
            Card::from_row(b"x".to_vec(), "", "sha256|2023-01-01T12:00:00.000000Z|UTC"),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            Card::from_row(b"x".to_vec(), "abc", ""),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            Card::from_row(b"x".to_vec(), "abc", "sha256|not-iso|UTC"),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn reconstructed_text_rows_decode() {
        let card = Card::from_row(
            b"plain text row".to_vec(),
            "abc",
            "sha256|2023-01-01T12:00:00.000000Z|UTC",
        )
        .unwrap();
        assert_eq!(card.content_type(), Some("text/plain"));
        assert_eq!(card.content_as_text(), Some("plain text row"));
    }

    #[test]
    fn to_dict_summary() {
        let card = Card::new("hello").unwrap();
        let dict = card.to_dict();
        assert_eq!(dict["hash"], card.hash());
        assert_eq!(dict["hash_algorithm"], "sha256");
        assert_eq!(dict["size_bytes"], 5);
        assert_eq!(dict["content"], "hello");
    }
}
