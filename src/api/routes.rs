//! API routes over the service layer.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::{
    Country, DomainError, Language, RankingCriteria, ScanId,
};
use crate::ports::TaskRequest;
use crate::services::Services;

use super::error::ApiError;

type AppState = Arc<Services>;
type ApiResult<T> = Result<T, ApiError>;

pub fn router(services: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/monitoring/summary", get(monitoring_summary))
        .route("/pages", get(list_pages))
        .route("/pages/ranked", get(ranked_pages))
        .route("/pages/top", get(top_pages))
        .route("/pages/:id", get(get_page))
        .route("/pages/:id/score", get(get_page_score))
        .route("/pages/:id/score/recompute", post(recompute_page_score))
        .route("/pages/:id/metrics/history", get(page_metrics_history))
        .route("/pages/:id/products", get(page_products))
        .route("/pages/:id/products/insights", get(page_product_insights))
        .route("/pages/:id/products/sync", post(sync_page_products))
        .route("/pages/:id/creatives/insights", get(page_creative_insights))
        .route("/scans/:id", get(get_scan))
        .route("/keywords/search", post(keyword_search))
        .route("/alerts", get(recent_alerts))
        .route("/alerts/:page_id", get(page_alerts))
        .route("/watchlists", get(list_watchlists).post(create_watchlist))
        .route("/watchlists/:id", get(get_watchlist).delete(delete_watchlist))
        .route("/watchlists/:id/items", get(watchlist_items).post(add_watchlist_item))
        .route(
            "/watchlists/:id/items/:page_id",
            delete(remove_watchlist_item),
        )
        .route("/watchlists/:id/scan_now", post(watchlist_scan_now))
        .with_state(services)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }))
}

async fn monitoring_summary(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let summary = state.monitoring.execute().await?;
    Ok(Json(serde_json::to_value(summary).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
struct PageListQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

async fn list_pages(
    Query(params): Query<PageListQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0);
    let pages = state.pages.list(limit, offset).await?;
    let total = state.pages.count().await?;
    Ok(Json(json!({ "pages": pages, "total": total })))
}

async fn get_page(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let page = state
        .pages
        .get(&id)
        .await?
        .ok_or_else(|| DomainError::not_found("Page", &id))?;
    Ok(Json(serde_json::to_value(page).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
struct RankedQuery {
    limit: Option<u32>,
    offset: Option<u32>,
    tier: Option<String>,
    min_score: Option<f64>,
    country: Option<String>,
}

async fn ranked_pages(
    Query(params): Query<RankedQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let criteria = RankingCriteria::new(
        params.limit,
        params.offset,
        params.tier.as_deref(),
        params.min_score,
        params.country.as_deref(),
    )?;
    let result = state.ranked_shops.execute(criteria).await?;
    Ok(Json(json!({
        "items": result.items,
        "total": result.total,
        "limit": result.limit,
        "offset": result.offset,
        "has_more": result.has_more(),
    })))
}

#[derive(Debug, Deserialize)]
struct TopQuery {
    limit: Option<u32>,
}

async fn top_pages(
    Query(params): Query<TopQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let criteria = RankingCriteria::new(params.limit, None, None, None, None)?;
    let result = state.ranked_shops.execute(criteria).await?;
    Ok(Json(json!({ "items": result.items })))
}

async fn get_page_score(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let score = state
        .scoring
        .get_latest_by_page_id(&id)
        .await?
        .ok_or_else(|| DomainError::not_found("ShopScore", &id))?;
    Ok(Json(json!({
        "page_id": score.page_id,
        "score": score.score,
        "tier": score.tier(),
        "components": score.components,
        "created_at": score.created_at,
    })))
}

async fn recompute_page_score(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if state.pages.get(&id).await?.is_none() {
        return Err(DomainError::not_found("Page", &id).into());
    }
    state
        .dispatcher
        .dispatch(TaskRequest::ComputeShopScore { page_id: id.clone() })
        .await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "page_id": id, "dispatched": true }))))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    limit: Option<u32>,
}

async fn page_metrics_history(
    Path(id): Path<String>,
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let history = state
        .metrics_history
        .execute(&id, params.date_from, params.date_to, params.limit)
        .await?;
    Ok(Json(json!({
        "page_id": history.page_id,
        "first_date": history.first_date(),
        "last_date": history.last_date(),
        "score_trend": history.score_trend(),
        "metrics": history.metrics,
    })))
}

#[derive(Debug, Deserialize)]
struct ProductsQuery {
    sort_by: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

async fn page_products(
    Path(id): Path<String>,
    Query(params): Query<ProductsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let products = state
        .products
        .list_by_page(
            &id,
            params.sort_by.as_deref(),
            params.limit.unwrap_or(50).min(200),
            params.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(json!({ "products": products })))
}

async fn page_product_insights(
    Path(id): Path<String>,
    Query(params): Query<ProductsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let total = state.products.count_by_page(&id).await?;
    let products = state
        .products
        .list_by_page(
            &id,
            params.sort_by.as_deref(),
            params.limit.unwrap_or(50).min(200),
            params.offset.unwrap_or(0),
        )
        .await?;

    let priced: Vec<f64> = products.iter().filter_map(|p| p.price_min).collect();
    let avg_price = if priced.is_empty() {
        None
    } else {
        Some(priced.iter().sum::<f64>() / priced.len() as f64)
    };
    let available = products.iter().filter(|p| p.available).count();

    Ok(Json(json!({
        "page_id": id,
        "total_products": total,
        "avg_price_min": avg_price,
        "available_count": available,
        "products": products,
    })))
}

async fn sync_page_products(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let result = state.sync_products.execute(&id).await?;
    Ok(Json(json!({
        "page_id": result.page_id,
        "products_synced": result.products_synced,
        "is_commerce": result.is_commerce,
        "skipped_reason": result.skipped_reason,
    })))
}

async fn page_creative_insights(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let result = state.creative_insights.execute(&id, 5).await?;
    Ok(Json(json!({
        "page_id": result.page_id,
        "insights": result.insights,
        "ads_analyzed": result.ads_analyzed,
        "cached_analyses": result.cached_analyses,
        "new_analyses": result.new_analyses,
    })))
}

async fn get_scan(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let scan_id = ScanId::parse(&id)?;
    let scan = state
        .scans
        .get(scan_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Scan", &id))?;
    Ok(Json(serde_json::to_value(scan).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
struct KeywordSearchBody {
    keyword: String,
    country: String,
    language: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct KeywordSearchResponse {
    scan_id: String,
    pages: Vec<String>,
    count_ads: u32,
    new_pages: u32,
    page_scans_dispatched: u32,
}

/// Run the keyword search, then chain one deep-page scan per page.
async fn keyword_search(
    State(state): State<AppState>,
    Json(body): Json<KeywordSearchBody>,
) -> ApiResult<Json<KeywordSearchResponse>> {
    let country = Country::parse(&body.country)?;
    let language = match &body.language {
        Some(code) => Some(Language::parse(code)?),
        None => None,
    };

    let result = state
        .search_ads
        .execute(
            &body.keyword,
            country,
            language,
            body.limit.unwrap_or(1000).min(1000),
            None,
        )
        .await?;

    let mut dispatched = 0_u32;
    for page_id in &result.pages {
        state
            .dispatcher
            .dispatch(TaskRequest::ScanPage {
                page_id: page_id.clone(),
                scan_id: ScanId::generate(),
                country,
            })
            .await?;
        dispatched += 1;
    }

    Ok(Json(KeywordSearchResponse {
        scan_id: result.scan_id.to_string(),
        pages: result.pages,
        count_ads: result.count_ads,
        new_pages: result.new_pages,
        page_scans_dispatched: dispatched,
    }))
}

#[derive(Debug, Deserialize)]
struct AlertsQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

async fn recent_alerts(
    Query(params): Query<AlertsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let alerts = state
        .alerts
        .list_recent(params.limit.unwrap_or(50).min(500))
        .await?;
    Ok(Json(json!({ "alerts": alerts })))
}

async fn page_alerts(
    Path(page_id): Path<String>,
    Query(params): Query<AlertsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let alerts = state
        .alerts
        .list_by_page(
            &page_id,
            params.limit.unwrap_or(50).min(500),
            params.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(json!({ "page_id": page_id, "alerts": alerts })))
}

#[derive(Debug, Deserialize)]
struct WatchlistBody {
    name: String,
    description: Option<String>,
}

async fn create_watchlist(
    State(state): State<AppState>,
    Json(body): Json<WatchlistBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let watchlist = state
        .watchlists
        .create(&body.name, body.description.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(watchlist).unwrap_or_default()),
    ))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

async fn list_watchlists(
    Query(params): Query<ListQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let watchlists = state
        .watchlists
        .list(params.limit.unwrap_or(50).min(200), params.offset.unwrap_or(0))
        .await?;
    Ok(Json(json!({ "watchlists": watchlists })))
}

async fn get_watchlist(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let details = state.watchlists.details(&id).await?;
    Ok(Json(json!({
        "watchlist": details.watchlist,
        "pages": details.pages,
    })))
}

async fn delete_watchlist(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    state.watchlists.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn watchlist_items(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let details = state.watchlists.details(&id).await?;
    Ok(Json(json!({ "pages": details.pages })))
}

#[derive(Debug, Deserialize)]
struct WatchlistItemBody {
    page_id: String,
}

async fn add_watchlist_item(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<WatchlistItemBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let item = state.watchlists.add_page(&id, &body.page_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(item).unwrap_or_default()),
    ))
}

async fn remove_watchlist_item(
    Path((id, page_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    state.watchlists.remove_page(&id, &page_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn watchlist_scan_now(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let result = state.watchlists.scan_now(&id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "watchlist_id": id, "pages_dispatched": result.pages_dispatched })),
    ))
}
