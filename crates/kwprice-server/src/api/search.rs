//! `/api/search` (products) and `/api/food` handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Extension, Json,
};
use kwprice_core::Vertical;
use kwprice_scraper::{AggregationResult, Query as SearchQuery};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

pub(super) const MISSING_QUERY: &str = "Missing query ?q=";

/// `debug` arrives as `1`/`true` in query strings and as a bool, number, or
/// string in JSON bodies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum DebugFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl DebugFlag {
    fn enabled(&self) -> bool {
        match self {
            DebugFlag::Bool(b) => *b,
            DebugFlag::Number(n) => *n == 1,
            DebugFlag::Text(s) => {
                let s = s.trim();
                s == "1" || s.eq_ignore_ascii_case("true")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
    pub city: Option<String>,
    pub debug: Option<DebugFlag>,
}

impl SearchParams {
    /// Fill fields missing from `self` (the query string) from the body.
    fn merged_with(self, body: SearchParams) -> SearchParams {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        SearchParams {
            q: non_blank(self.q).or(body.q),
            city: non_blank(self.city).or(body.city),
            debug: self.debug.or(body.debug),
        }
    }

    fn debug_enabled(&self) -> bool {
        self.debug.as_ref().is_some_and(DebugFlag::enabled)
    }
}

pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<AggregationResult>, ApiError> {
    run_search(&state, &req_id, Vertical::Products, params).await
}

pub(super) async fn search_products_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
    body: Bytes,
) -> Result<Json<AggregationResult>, ApiError> {
    let params = params.merged_with(parse_body(&body)?);
    run_search(&state, &req_id, Vertical::Products, params).await
}

pub(super) async fn search_food(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<AggregationResult>, ApiError> {
    run_search(&state, &req_id, Vertical::Food, params).await
}

pub(super) async fn search_food_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
    body: Bytes,
) -> Result<Json<AggregationResult>, ApiError> {
    let params = params.merged_with(parse_body(&body)?);
    run_search(&state, &req_id, Vertical::Food, params).await
}

fn parse_body(body: &[u8]) -> Result<SearchParams, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SearchParams::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

async fn run_search(
    state: &AppState,
    req_id: &RequestId,
    vertical: Vertical,
    params: SearchParams,
) -> Result<Json<AggregationResult>, ApiError> {
    let debug = params.debug_enabled();
    let Some(query) = SearchQuery::new(params.q.as_deref().unwrap_or_default(), vertical) else {
        return Err(ApiError::bad_request(MISSING_QUERY));
    };
    let query = query
        .with_city(params.city.as_deref(), &state.default_city)
        .with_debug(debug);

    tracing::info!(
        request_id = %req_id.0,
        vertical = %vertical,
        query = %query.text,
        "search request"
    );
    Ok(Json(state.aggregator(vertical).run(&query).await))
}
