pub mod in_memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::card::Card;
use crate::error::Result;
use crate::page::Page;

/// Narrow persistence contract the collection relies on. Rows are keyed
/// by `hash` (unique); writes are durable before `add` returns;
/// enumeration order is insertion order and stable across calls in the
/// absence of writes.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Inserts `(hash, g_time, content_bytes)`. Fails with
    /// `HashConflict` when the hash is already present; interpreting the
    /// conflict is the collection's job, not the engine's.
    async fn add(&self, card: &Card) -> Result<()>;

    /// Reconstructs the stored row as a card, or `None` when missing.
    async fn get(&self, hash: &str) -> Result<Option<Card>>;

    /// Removes the row. Idempotent: deleting a missing hash returns
    /// `false`, not an error.
    async fn delete(&self, hash: &str) -> Result<bool>;

    /// Replaces the bytes bound to `hash` without re-verifying the
    /// digest. Returns `false` when no such row exists.
    async fn update(&self, hash: &str, new_content: &[u8]) -> Result<bool>;

    async fn count(&self) -> Result<u64>;

    async fn clear(&self) -> Result<()>;

    /// One page of rows in insertion order. `page_number > total_pages`
    /// is `PageOutOfRange` whenever the store is non-empty.
    async fn get_page(&self, page_number: u64, page_size: u64) -> Result<Page<Card>>;

    async fn get_all(&self, page_number: u64, page_size: u64) -> Result<Page<Card>> {
        self.get_page(page_number, page_size).await
    }

    /// Substring match of `query` against each row's bytes interpreted
    /// as UTF-8 with lossy fallback, paginated over the matches.
    async fn search_by_content(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<Page<Card>>;
}
