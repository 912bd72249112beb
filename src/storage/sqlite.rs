use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::StorageEngine;
use crate::card::Card;
use crate::error::{Result, StoreError};
use crate::page::{self, Page};

const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Message raised by the uniqueness trigger; `add` maps it to
/// `HashConflict`.
const UNIQUE_HASH_MESSAGE: &str = "Card with this hash already exists";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS card (
    hash    TEXT PRIMARY KEY,
    g_time  TEXT NOT NULL,
    content BLOB NOT NULL
);
CREATE TRIGGER IF NOT EXISTS ensure_unique_hash
BEFORE INSERT ON card
WHEN EXISTS (SELECT 1 FROM card WHERE hash = NEW.hash)
BEGIN
    SELECT RAISE(ABORT, 'Card with this hash already exists');
END;
"#;

/// SQLite-backed engine. `rowid` preserves insertion order for stable
/// enumeration; the uniqueness trigger backs up the primary key so a
/// conflicting insert aborts with a recognizable message.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref()).map_err(engine_failure)?;
        info!("opened card store at {}", path.as_ref().display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(engine_failure)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(engine_failure)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(engine_failure)?;
        conn.execute_batch(SCHEMA).map_err(engine_failure)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn all_rows(conn: &Connection) -> Result<Vec<Card>> {
        let mut stmt = conn
            .prepare("SELECT hash, g_time, content FROM card ORDER BY rowid")
            .map_err(engine_failure)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(engine_failure)?;
        let mut cards = Vec::new();
        for row in rows {
            let (hash, g_time, content) = row.map_err(engine_failure)?;
            cards.push(Card::from_row(content, &hash, &g_time)?);
        }
        Ok(cards)
    }
}

#[async_trait]
impl StorageEngine for SqliteEngine {
    async fn add(&self, card: &Card) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO card (hash, g_time, content) VALUES (?1, ?2, ?3)",
            params![card.hash(), card.g_time().to_string(), card.content_bytes()],
        );
        match result {
            Ok(_) => {
                debug!("stored card {}", card.hash());
                Ok(())
            }
            Err(err) if is_hash_conflict(&err) => Err(StoreError::HashConflict {
                hash: card.hash().to_string(),
            }),
            Err(err) => Err(engine_failure(err)),
        }
    }

    async fn get(&self, hash: &str) -> Result<Option<Card>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT g_time, content FROM card WHERE hash = ?1",
                params![hash],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()
            .map_err(engine_failure)?;
        match row {
            Some((g_time, content)) => Ok(Some(Card::from_row(content, hash, &g_time)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, hash: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn
            .execute("DELETE FROM card WHERE hash = ?1", params![hash])
            .map_err(engine_failure)?;
        Ok(affected > 0)
    }

    async fn update(&self, hash: &str, new_content: &[u8]) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn
            .execute(
                "UPDATE card SET content = ?2 WHERE hash = ?1",
                params![hash, new_content],
            )
            .map_err(engine_failure)?;
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM card", [], |row| row.get(0))
            .map_err(engine_failure)?;
        Ok(count as u64)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM card", [])
            .map_err(engine_failure)?;
        Ok(())
    }

    async fn get_page(&self, page_number: u64, page_size: u64) -> Result<Page<Card>> {
        let conn = self.conn.lock().unwrap();
        let cards = Self::all_rows(&conn)?;
        page::paginate(cards, page_number, page_size)
    }

    async fn search_by_content(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<Page<Card>> {
        let conn = self.conn.lock().unwrap();
        let matches: Vec<Card> = Self::all_rows(&conn)?
            .into_iter()
            .filter(|card| String::from_utf8_lossy(card.content_bytes()).contains(query))
            .collect();
        page::paginate(matches, page_number, page_size)
    }
}

/// The trigger raises with its own message; the primary key is a
/// redundant guard that reports a constraint violation instead.
fn is_hash_conflict(err: &rusqlite::Error) -> bool {
    let message = err.to_string();
    message.contains(UNIQUE_HASH_MESSAGE) || message.contains("UNIQUE constraint failed: card.hash")
}

fn engine_failure(err: rusqlite::Error) -> StoreError {
    StoreError::EngineFailure(err.to_string())
}
