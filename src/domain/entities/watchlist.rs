//! Watchlist entities - user-named page collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Watchlist {
    pub fn new(id: String, name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: String, description: Option<String>) {
        self.name = name;
        self.description = description;
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Watchlist {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Watchlist {}

/// Membership row, unique on (watchlist_id, page_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: String,
    pub watchlist_id: String,
    pub page_id: String,
    pub added_at: DateTime<Utc>,
}

impl WatchlistItem {
    pub fn new(id: String, watchlist_id: String, page_id: String) -> Self {
        Self {
            id,
            watchlist_id,
            page_id,
            added_at: Utc::now(),
        }
    }
}

impl PartialEq for WatchlistItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WatchlistItem {}
