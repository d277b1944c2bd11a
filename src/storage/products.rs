//! Product and commerce-profile repositories.

use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::domain::{CommerceProfile, DomainError, DomainResult, PaymentMethod, Product};
use crate::ports::{CommerceProfileRepository, ProductRepository};

use super::database::Database;
use super::support::*;

pub struct SqliteProductRepository {
    db: Database,
}

impl SqliteProductRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_product(row: &Row<'_>) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            handle: row.get("handle")?,
            title: row.get("title")?,
            url: row.get("url")?,
            price_min: row.get("price_min")?,
            price_max: row.get("price_max")?,
            currency: row.get("currency")?,
            available: row.get::<_, i64>("available")? != 0,
            tags: from_json(&row.get::<_, String>("tags")?),
            vendor: row.get("vendor")?,
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
            updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
        })
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn save_many(&self, products: &[Product]) -> DomainResult<()> {
        if products.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.conn();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::repository("save_products", e))?;

        for product in products {
            tx.execute(
                "INSERT INTO products (id, page_id, handle, title, url, price_min, price_max, \
                 currency, available, tags, vendor, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
                 ON CONFLICT(page_id, handle) DO UPDATE SET \
                    title = excluded.title, \
                    url = excluded.url, \
                    price_min = excluded.price_min, \
                    price_max = excluded.price_max, \
                    currency = excluded.currency, \
                    available = excluded.available, \
                    tags = excluded.tags, \
                    vendor = excluded.vendor, \
                    updated_at = excluded.updated_at",
                params![
                    product.id,
                    product.page_id,
                    product.handle,
                    product.title,
                    product.url,
                    product.price_min,
                    product.price_max,
                    product.currency,
                    product.available as i64,
                    to_json(&product.tags),
                    product.vendor,
                    ts(product.created_at),
                    ts(product.updated_at),
                ],
            )
            .map_err(|e| DomainError::repository("save_products", e))?;
        }

        tx.commit()
            .map_err(|e| DomainError::repository("save_products", e))
    }

    async fn list_by_page(
        &self,
        page_id: &str,
        sort_by: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<Product>> {
        let order = match sort_by {
            Some("price") => "price_min ASC",
            Some("recent") => "updated_at DESC",
            _ => "title ASC",
        };
        let sql = format!(
            "SELECT * FROM products WHERE page_id = ?1 ORDER BY {} LIMIT ?2 OFFSET ?3",
            order
        );

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::repository("list_products", e))?;
        let rows = stmt
            .query_map(params![page_id, limit as i64, offset as i64], Self::row_to_product)
            .map_err(|e| DomainError::repository("list_products", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_products", e))
    }

    async fn count_by_page(&self, page_id: &str) -> DomainResult<u64> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM products WHERE page_id = ?1",
            params![page_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c as u64)
        .map_err(|e| DomainError::repository("count_products", e))
    }
}

pub struct SqliteCommerceProfileRepository {
    db: Database,
}

impl SqliteCommerceProfileRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommerceProfileRepository for SqliteCommerceProfileRepository {
    async fn save(&self, profile: &CommerceProfile) -> DomainResult<()> {
        let methods: Vec<&str> = profile.payment_methods.iter().map(|m| m.as_str()).collect();
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO commerce_profiles (id, page_id, shop_name, theme, installed_apps, \
             payment_methods, pixel_ids, trust_score, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT(page_id) DO UPDATE SET \
                shop_name = excluded.shop_name, \
                theme = excluded.theme, \
                installed_apps = excluded.installed_apps, \
                payment_methods = excluded.payment_methods, \
                pixel_ids = excluded.pixel_ids, \
                trust_score = excluded.trust_score, \
                updated_at = excluded.updated_at",
            params![
                profile.id,
                profile.page_id,
                profile.shop_name,
                profile.theme,
                to_json(&profile.installed_apps),
                to_json(&methods),
                to_json(&profile.pixel_ids),
                profile.trust_score,
                ts(profile.created_at),
                ts(profile.updated_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_profile", e))?;
        Ok(())
    }

    async fn get_by_page_id(&self, page_id: &str) -> DomainResult<Option<CommerceProfile>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM commerce_profiles WHERE page_id = ?1")
            .map_err(|e| DomainError::repository("get_profile", e))?;
        let mut rows = stmt
            .query_map(params![page_id], |row| {
                let methods: Vec<String> = from_json(&row.get::<_, String>("payment_methods")?);
                Ok(CommerceProfile {
                    id: row.get("id")?,
                    page_id: row.get("page_id")?,
                    shop_name: row.get("shop_name")?,
                    theme: row.get("theme")?,
                    installed_apps: from_json(&row.get::<_, String>("installed_apps")?),
                    payment_methods: methods
                        .iter()
                        .filter_map(|m| PaymentMethod::parse(m).ok())
                        .collect(),
                    pixel_ids: from_json(&row.get::<_, String>("pixel_ids")?),
                    trust_score: row.get("trust_score")?,
                    created_at: parse_ts(&row.get::<_, String>("created_at")?),
                    updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
                })
            })
            .map_err(|e| DomainError::repository("get_profile", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_profile", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, handle: &str, title: &str) -> Product {
        let mut p = Product::new(id.into(), "p-1".into(), handle.into(), title.into());
        p.price_min = Some(19.99);
        p.price_max = Some(29.99);
        p.tags = vec!["lamp".into(), "led".into()];
        p
    }

    #[tokio::test]
    async fn products_upsert_by_page_and_handle() {
        let repo = SqliteProductRepository::new(Database::open_in_memory().unwrap());
        repo.save_many(&[product("pr-1", "led-lamp", "LED Lamp")])
            .await
            .unwrap();
        repo.save_many(&[product("pr-2", "led-lamp", "LED Lamp v2")])
            .await
            .unwrap();

        let products = repo.list_by_page("p-1", None, 50, 0).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "LED Lamp v2");
        assert_eq!(products[0].tags.len(), 2);
        assert_eq!(repo.count_by_page("p-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_sorts_by_requested_key() {
        let repo = SqliteProductRepository::new(Database::open_in_memory().unwrap());
        let mut cheap = product("pr-1", "a", "Zeta");
        cheap.price_min = Some(5.0);
        let mut pricey = product("pr-2", "b", "Alpha");
        pricey.price_min = Some(50.0);
        repo.save_many(&[cheap, pricey]).await.unwrap();

        let by_title = repo.list_by_page("p-1", None, 50, 0).await.unwrap();
        assert_eq!(by_title[0].title, "Alpha");

        let by_price = repo.list_by_page("p-1", Some("price"), 50, 0).await.unwrap();
        assert_eq!(by_price[0].price_min, Some(5.0));
    }

    #[tokio::test]
    async fn profile_round_trips_with_payment_methods() {
        let repo = SqliteCommerceProfileRepository::new(Database::open_in_memory().unwrap());
        let mut profile = CommerceProfile::new("cp-1".into(), "p-1".into());
        profile.shop_name = Some("Glow Shop".into());
        profile.theme = Some("Dawn".into());
        profile.payment_methods.insert(PaymentMethod::Paypal);
        profile.payment_methods.insert(PaymentMethod::Klarna);
        repo.save(&profile).await.unwrap();

        let loaded = repo.get_by_page_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.shop_name.as_deref(), Some("Glow Shop"));
        assert!(loaded.payment_methods.contains(&PaymentMethod::Paypal));
        assert!(loaded.payment_methods.contains(&PaymentMethod::Klarna));
    }
}
