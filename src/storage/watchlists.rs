//! Watchlist repositories. Membership is unique on
//! (watchlist_id, page_id).

use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::domain::{DomainError, DomainResult, Watchlist, WatchlistItem};
use crate::ports::WatchlistRepository;

use super::database::Database;
use super::support::*;

pub struct SqliteWatchlistRepository {
    db: Database,
}

impl SqliteWatchlistRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_watchlist(row: &Row<'_>) -> rusqlite::Result<Watchlist> {
        Ok(Watchlist {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
            updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
        })
    }

    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<WatchlistItem> {
        Ok(WatchlistItem {
            id: row.get("id")?,
            watchlist_id: row.get("watchlist_id")?,
            page_id: row.get("page_id")?,
            added_at: parse_ts(&row.get::<_, String>("added_at")?),
        })
    }
}

#[async_trait]
impl WatchlistRepository for SqliteWatchlistRepository {
    async fn save(&self, watchlist: &Watchlist) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO watchlists (id, name, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(id) DO UPDATE SET \
                name = excluded.name, \
                description = excluded.description, \
                updated_at = excluded.updated_at",
            params![
                watchlist.id,
                watchlist.name,
                watchlist.description,
                ts(watchlist.created_at),
                ts(watchlist.updated_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_watchlist", e))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Watchlist>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM watchlists WHERE id = ?1")
            .map_err(|e| DomainError::repository("get_watchlist", e))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_watchlist)
            .map_err(|e| DomainError::repository("get_watchlist", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_watchlist", e))
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Watchlist>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM watchlists ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            )
            .map_err(|e| DomainError::repository("list_watchlists", e))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_watchlist)
            .map_err(|e| DomainError::repository("list_watchlists", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_watchlists", e))
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let mut conn = self.db.conn();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::repository("delete_watchlist", e))?;
        tx.execute("DELETE FROM watchlist_items WHERE watchlist_id = ?1", params![id])
            .map_err(|e| DomainError::repository("delete_watchlist", e))?;
        tx.execute("DELETE FROM watchlists WHERE id = ?1", params![id])
            .map_err(|e| DomainError::repository("delete_watchlist", e))?;
        tx.commit()
            .map_err(|e| DomainError::repository("delete_watchlist", e))
    }

    async fn add_item(&self, item: &WatchlistItem) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO watchlist_items (id, watchlist_id, page_id, added_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![item.id, item.watchlist_id, item.page_id, ts(item.added_at)],
        )
        .map_err(|e| DomainError::repository("add_watchlist_item", e))?;
        Ok(())
    }

    async fn remove_item(&self, watchlist_id: &str, page_id: &str) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "DELETE FROM watchlist_items WHERE watchlist_id = ?1 AND page_id = ?2",
            params![watchlist_id, page_id],
        )
        .map_err(|e| DomainError::repository("remove_watchlist_item", e))?;
        Ok(())
    }

    async fn list_items(&self, watchlist_id: &str) -> DomainResult<Vec<WatchlistItem>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM watchlist_items WHERE watchlist_id = ?1 ORDER BY added_at ASC",
            )
            .map_err(|e| DomainError::repository("list_watchlist_items", e))?;
        let rows = stmt
            .query_map(params![watchlist_id], Self::row_to_item)
            .map_err(|e| DomainError::repository("list_watchlist_items", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_watchlist_items", e))
    }
}
