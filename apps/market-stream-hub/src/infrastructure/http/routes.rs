//! REST handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::market::{Candle, MarketStatus, Quote, SearchResult};

use super::ApiState;
use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchParams {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct HistoryParams {
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    interval: Option<String>,
}

pub(super) async fn root() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(super) async fn search_stocks(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let query = params.q.unwrap_or_default();
    state
        .search
        .search(&query)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Failed to search stocks"))
}

pub(super) async fn get_stock(
    State(state): State<Arc<ApiState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Quote>, ApiError> {
    state
        .quotes
        .get_quote(&symbol)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Failed to fetch stock data"))
}

pub(super) async fn get_stock_history(
    State(state): State<Arc<ApiState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Candle>>, ApiError> {
    let range = params.range.unwrap_or_default();
    let interval = params.interval.unwrap_or_default();
    state
        .history
        .get_history(&symbol, &range, &interval)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Failed to fetch stock history"))
}

pub(super) async fn market_status(State(state): State<Arc<ApiState>>) -> Json<MarketStatus> {
    Json(state.market.status().await)
}
