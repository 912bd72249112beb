use std::sync::Arc;

use tracing::{debug, warn};

use crate::card::{Card, CardContent};
use crate::error::{Result, StoreError};
use crate::events;
use crate::hashing::{HashAlgorithm, DEFAULT_HASH_ALGORITHM};
use crate::page::{self, Page};
use crate::storage::StorageEngine;

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Algorithm for event cards and for `Card::new`.
    pub default_algorithm: HashAlgorithm,
    /// Whether the weaker-algorithm card stays discoverable after a
    /// collision upgrade. Matches the original store when `true`.
    pub retain_original_on_collision: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            default_algorithm: DEFAULT_HASH_ALGORITHM,
            retain_original_on_collision: true,
        }
    }
}

/// Argument checks shared by the lookup and search operations. One
/// instance lives on the collection and is reused across calls.
#[derive(Debug, Default)]
struct ArgValidator;

impl ArgValidator {
    fn page_args(&self, page_number: u64, page_size: u64) -> Result<()> {
        if page_number < 1 {
            return Err(StoreError::InvalidArgument(
                "page_number must be >= 1".to_string(),
            ));
        }
        if page_size < 1 {
            return Err(StoreError::InvalidArgument(
                "page_size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    fn non_empty(&self, name: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(StoreError::InvalidArgument(format!("{name} is empty")));
        }
        Ok(())
    }
}

/// Front door of the store. Enforces the ingestion invariants: duplicate
/// detection, collision detection with algorithm upgrade, and event-card
/// emission. Holds no mutable state of its own beyond the engine handle.
pub struct Collection {
    engine: Arc<dyn StorageEngine>,
    config: CollectionConfig,
    validator: ArgValidator,
}

impl Collection {
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self::with_config(engine, CollectionConfig::default())
    }

    pub fn with_config(engine: Arc<dyn StorageEngine>, config: CollectionConfig) -> Self {
        Self {
            engine,
            config,
            validator: ArgValidator,
        }
    }

    /// Ingests a card. Returns the card's own hash on a plain insert; on
    /// a duplicate or collision, stores an event card describing the
    /// occurrence and returns the event card's hash instead.
    pub async fn add(&self, card: &Card) -> Result<String> {
        match self.engine.get(card.hash()).await? {
            None => match self.engine.add(card).await {
                Ok(()) => Ok(card.hash().to_string()),
                // A writer slipped in between the lookup and the insert.
                // The engine's uniqueness guard and our lookup must agree,
                // so re-read and take the branch the lookup would have.
                Err(StoreError::HashConflict { hash }) => {
                    match self.engine.get(&hash).await? {
                        Some(existing) => self.resolve_existing(card, &existing).await,
                        None => Err(StoreError::HashConflict { hash }),
                    }
                }
                Err(err) => Err(err),
            },
            Some(existing) => self.resolve_existing(card, &existing).await,
        }
    }

    /// The stored card and the incoming card share a hash; decide
    /// between the duplicate and collision branches. A conflicting write
    /// during the collision branch re-enters the decision against the
    /// row that won, bounded by the algorithm hierarchy.
    async fn resolve_existing(&self, card: &Card, existing: &Card) -> Result<String> {
        let mut incoming = card.clone();
        let mut stored = existing.clone();
        loop {
            if stored.content_bytes() == incoming.content_bytes() {
                debug!("duplicate content for card {}", incoming.hash());
                let payload = events::duplicate_event(&stored)?;
                let event_card = Card::with_algorithm(
                    CardContent::Text(payload),
                    self.config.default_algorithm,
                )?;
                self.engine.add(&event_card).await?;
                return Ok(event_card.hash().to_string());
            }
            warn!(
                "digest collision under {} for hash {}",
                incoming.hash_algorithm(),
                incoming.hash()
            );
            let upgraded = self.upgrade_card(&incoming)?;
            match self.engine.add(&upgraded).await {
                Ok(()) => {
                    if !self.config.retain_original_on_collision {
                        self.engine.delete(incoming.hash()).await?;
                    }
                    // The event card is written after the upgraded card; a
                    // cancellation between the two leaves the upgrade in
                    // place with no event recorded, which is permitted.
                    let payload = events::collision_event(&upgraded, &stored)?;
                    let event_card = Card::with_algorithm(
                        CardContent::Text(payload),
                        self.config.default_algorithm,
                    )?;
                    self.engine.add(&event_card).await?;
                    return Ok(event_card.hash().to_string());
                }
                // The upgraded hash was taken while we were deciding.
                // Re-read the winning row and take the branch a fresh
                // lookup would have taken.
                Err(StoreError::HashConflict { hash }) => match self.engine.get(&hash).await? {
                    Some(winner) => {
                        incoming = upgraded;
                        stored = winner;
                    }
                    None => return Err(StoreError::HashConflict { hash }),
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Rebuilds the incoming content under the next stronger algorithm
    /// and checks that the hierarchy actually strengthened the digest.
    fn upgrade_card(&self, card: &Card) -> Result<Card> {
        let stronger = card.hash_algorithm().upgrade()?;
        let upgraded =
            Card::with_algorithm(CardContent::Bytes(card.content_bytes().to_vec()), stronger)?;
        if upgraded.hash_algorithm() == card.hash_algorithm()
            || upgraded.hash_algorithm().digest_len() <= card.hash_algorithm().digest_len()
        {
            return Err(StoreError::UpgradeFailed {
                from: card.hash_algorithm().name().to_string(),
                to: upgraded.hash_algorithm().name().to_string(),
            });
        }
        Ok(upgraded)
    }

    pub async fn get(&self, hash: &str) -> Result<Option<Card>> {
        self.engine.get(hash).await
    }

    pub async fn delete(&self, hash: &str) -> Result<bool> {
        self.engine.delete(hash).await
    }

    pub async fn count(&self) -> Result<u64> {
        self.engine.count().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.engine.clear().await
    }

    pub async fn get_page(&self, page_number: u64, page_size: u64) -> Result<Page<Card>> {
        self.validator.page_args(page_number, page_size)?;
        let result = self.engine.get_page(page_number, page_size).await?;
        Ok(Page::new(
            result.items,
            result.total_items,
            page_number,
            page_size,
        ))
    }

    pub async fn get_all(&self, page_number: u64, page_size: u64) -> Result<Page<Card>> {
        self.validator.page_args(page_number, page_size)?;
        let result = self.engine.get_all(page_number, page_size).await?;
        Ok(Page::new(
            result.items,
            result.total_items,
            page_number,
            page_size,
        ))
    }

    /// Exact-hash lookup as a paginated search, filtered on this side of
    /// the engine boundary.
    pub async fn search_by_hash(
        &self,
        hash: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<Page<Card>> {
        self.validator.non_empty("hash", hash)?;
        self.validator.page_args(page_number, page_size)?;
        let total = self.engine.count().await?;
        let matches = if total == 0 {
            Vec::new()
        } else {
            self.engine
                .get_all(1, total)
                .await?
                .items
                .into_iter()
                .filter(|card| card.hash() == hash)
                .collect()
        };
        page::paginate(matches, page_number, page_size)
    }

    pub async fn search_by_content(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<Page<Card>> {
        self.validator.non_empty("query", query)?;
        self.validator.page_args(page_number, page_size)?;
        let result = self
            .engine
            .search_by_content(query, page_number, page_size)
            .await?;
        Ok(Page::new(
            result.items,
            result.total_items,
            page_number,
            page_size,
        ))
    }

    /// Replaces the bytes stored under `hash`. Returns `false` when no
    /// such card exists. The stored digest is NOT recomputed, so the row
    /// no longer satisfies hash == digest(content); provided for host
    /// applications that accept that hazard.
    pub async fn update(&self, hash: &str, new_content: &[u8]) -> Result<bool> {
        match self.engine.get(hash).await? {
            None => Ok(false),
            Some(_) => self.engine.update(hash, new_content).await,
        }
    }
}
