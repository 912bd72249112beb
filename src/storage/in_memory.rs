use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::StorageEngine;
use crate::card::Card;
use crate::error::{Result, StoreError};
use crate::page::{self, Page};

#[derive(Debug, Clone)]
struct Row {
    hash: String,
    g_time: String,
    content: Vec<u8>,
}

impl Row {
    fn to_card(&self) -> Result<Card> {
        Card::from_row(self.content.clone(), &self.hash, &self.g_time)
    }
}

/// In-memory engine for development and testing. Rows live in a Vec so
/// enumeration order is insertion order; the mutex serializes writes,
/// which keeps racing same-content adds resolvable by the collection.
pub struct InMemoryEngine {
    rows: Arc<Mutex<Vec<Row>>>,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl StorageEngine for InMemoryEngine {
    async fn add(&self, card: &Card) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.hash == card.hash()) {
            return Err(StoreError::HashConflict {
                hash: card.hash().to_string(),
            });
        }
        rows.push(Row {
            hash: card.hash().to_string(),
            g_time: card.g_time().to_string(),
            content: card.content_bytes().to_vec(),
        });
        debug!("stored card {}", card.hash());
        Ok(())
    }

    async fn get(&self, hash: &str) -> Result<Option<Card>> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|r| r.hash == hash)
            .map(Row::to_card)
            .transpose()
    }

    async fn delete(&self, hash: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.hash != hash);
        let removed = rows.len() < before;
        if removed {
            debug!("deleted card {hash}");
        }
        Ok(removed)
    }

    async fn update(&self, hash: &str, new_content: &[u8]) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.hash == hash) {
            Some(row) => {
                row.content = new_content.to_vec();
                debug!("replaced content for card {hash}");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn clear(&self) -> Result<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    async fn get_page(&self, page_number: u64, page_size: u64) -> Result<Page<Card>> {
        let cards = self.snapshot()?;
        page::paginate(cards, page_number, page_size)
    }

    async fn search_by_content(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<Page<Card>> {
        let rows: Vec<Row> = self.rows.lock().unwrap().clone();
        let mut matches = Vec::new();
        for row in &rows {
            if String::from_utf8_lossy(&row.content).contains(query) {
                matches.push(row.to_card()?);
            }
        }
        page::paginate(matches, page_number, page_size)
    }
}

impl InMemoryEngine {
    /// Point-in-time snapshot of all rows as cards, in insertion order.
    fn snapshot(&self) -> Result<Vec<Card>> {
        let rows: Vec<Row> = self.rows.lock().unwrap().clone();
        rows.iter().map(Row::to_card).collect()
    }
}
