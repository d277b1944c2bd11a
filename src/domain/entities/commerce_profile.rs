//! CommerceProfile entity - per-page storefront fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PaymentMethods;

/// Enriched fingerprint of a verified commerce storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommerceProfile {
    pub id: String,
    pub page_id: String,
    pub shop_name: Option<String>,
    pub theme: Option<String>,
    pub installed_apps: Vec<String>,
    pub payment_methods: PaymentMethods,
    pub pixel_ids: Vec<String>,
    pub trust_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommerceProfile {
    pub fn new(id: String, page_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            page_id,
            shop_name: None,
            theme: None,
            installed_apps: Vec::new(),
            payment_methods: PaymentMethods::new(),
            pixel_ids: Vec::new(),
            trust_score: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl PartialEq for CommerceProfile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CommerceProfile {}
