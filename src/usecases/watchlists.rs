//! Watchlist use cases: CRUD over collections plus on-demand bulk
//! rescoring of all member pages.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult, Page, Watchlist, WatchlistItem};
use crate::ports::{PageRepository, TaskDispatcherPort, TaskRequest, WatchlistRepository};

pub struct WatchlistsUseCase {
    watchlists: Arc<dyn WatchlistRepository>,
    pages: Arc<dyn PageRepository>,
    dispatcher: Arc<dyn TaskDispatcherPort>,
}

#[derive(Debug, Clone)]
pub struct WatchlistDetails {
    pub watchlist: Watchlist,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanNowResult {
    pub pages_dispatched: u32,
}

impl WatchlistsUseCase {
    pub fn new(
        watchlists: Arc<dyn WatchlistRepository>,
        pages: Arc<dyn PageRepository>,
        dispatcher: Arc<dyn TaskDispatcherPort>,
    ) -> Self {
        Self {
            watchlists,
            pages,
            dispatcher,
        }
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> DomainResult<Watchlist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidKeyword(
                "watchlist name cannot be empty".into(),
            ));
        }
        let watchlist = Watchlist::new(
            Uuid::new_v4().to_string(),
            name.to_string(),
            description.map(str::to_string),
        );
        self.watchlists.save(&watchlist).await?;
        info!(watchlist_id = %watchlist.id, name = %watchlist.name, "Watchlist created");
        Ok(watchlist)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Watchlist> {
        self.watchlists
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Watchlist", id))
    }

    pub async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Watchlist>> {
        self.watchlists.list(limit, offset).await
    }

    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        self.get(id).await?;
        self.watchlists.delete(id).await
    }

    pub async fn add_page(&self, watchlist_id: &str, page_id: &str) -> DomainResult<WatchlistItem> {
        self.get(watchlist_id).await?;
        if self.pages.get(page_id).await?.is_none() {
            return Err(DomainError::not_found("Page", page_id));
        }

        let item = WatchlistItem::new(
            Uuid::new_v4().to_string(),
            watchlist_id.to_string(),
            page_id.to_string(),
        );
        self.watchlists.add_item(&item).await?;
        info!(watchlist_id = %watchlist_id, page_id = %page_id, "Page added to watchlist");
        Ok(item)
    }

    pub async fn remove_page(&self, watchlist_id: &str, page_id: &str) -> DomainResult<()> {
        self.get(watchlist_id).await?;
        self.watchlists.remove_item(watchlist_id, page_id).await
    }

    /// Watchlist plus its member pages. An item whose page is missing
    /// should be unreachable under the unique constraint; it is logged
    /// as an audit trail and skipped.
    pub async fn details(&self, watchlist_id: &str) -> DomainResult<WatchlistDetails> {
        let watchlist = self.get(watchlist_id).await?;
        let items = self.watchlists.list_items(watchlist_id).await?;

        let mut pages = Vec::with_capacity(items.len());
        for item in &items {
            match self.pages.get(&item.page_id).await? {
                Some(page) => pages.push(page),
                None => {
                    warn!(
                        watchlist_id = %watchlist_id,
                        page_id = %item.page_id,
                        "Watchlist item references a missing page"
                    );
                }
            }
        }

        Ok(WatchlistDetails { watchlist, pages })
    }

    /// Enqueue a score recomputation for every member page.
    pub async fn scan_now(&self, watchlist_id: &str) -> DomainResult<ScanNowResult> {
        let details = self.details(watchlist_id).await?;

        let mut dispatched = 0_u32;
        for page in &details.pages {
            self.dispatcher
                .dispatch(TaskRequest::ComputeShopScore {
                    page_id: page.id.clone(),
                })
                .await?;
            dispatched += 1;
        }

        info!(watchlist_id = %watchlist_id, pages = dispatched, "Watchlist rescore dispatched");
        Ok(ScanNowResult {
            pages_dispatched: dispatched,
        })
    }
}
