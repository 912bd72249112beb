use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::error::Result;
use crate::gtime::ISO_FORMAT;

/// Payload recorded when an ingestion attempt byte-matches a card that
/// is already stored. Carries hashes and algorithm names only, never raw
/// content bytes.
#[derive(Debug, Serialize, Deserialize)]
pub struct DuplicateEvent {
    pub event_type: String,
    pub timestamp: String,
    pub hashes: Vec<String>,
    pub algorithm: String,
    pub context: String,
}

/// Payload recorded when two different byte strings produced the same
/// digest and the store answered with an algorithm upgrade.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub event_type: String,
    pub timestamp: String,
    pub hashes: Vec<String>,
    pub algorithms: Vec<String>,
    pub context: String,
}

pub fn duplicate_event(original: &Card) -> Result<String> {
    let payload = DuplicateEvent {
        event_type: "duplicate".to_string(),
        timestamp: Utc::now().format(ISO_FORMAT).to_string(),
        hashes: vec![original.hash().to_string()],
        algorithm: original.hash_algorithm().name().to_string(),
        context: "duplicate content received; original card left untouched".to_string(),
    };
    Ok(serde_json::to_string(&payload)?)
}

pub fn collision_event(new_card: &Card, existing_card: &Card) -> Result<String> {
    let payload = CollisionEvent {
        event_type: "collision".to_string(),
        timestamp: Utc::now().format(ISO_FORMAT).to_string(),
        hashes: vec![
            existing_card.hash().to_string(),
            new_card.hash().to_string(),
        ],
        algorithms: vec![
            existing_card.hash_algorithm().name().to_string(),
            new_card.hash_algorithm().name().to_string(),
        ],
        context: "digest collision resolved by algorithm upgrade".to_string(),
    };
    Ok(serde_json::to_string(&payload)?)
}
