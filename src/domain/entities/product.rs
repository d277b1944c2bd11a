//! Product entity - one catalog item scoped to a page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub page_id: String,
    pub handle: String,
    pub title: String,
    pub url: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub currency: Option<String>,
    pub available: bool,
    pub tags: Vec<String>,
    pub vendor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: String, page_id: String, handle: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            page_id,
            handle,
            title,
            url: None,
            price_min: None,
            price_max: None,
            currency: None,
            available: true,
            tags: Vec::new(),
            vendor: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}
