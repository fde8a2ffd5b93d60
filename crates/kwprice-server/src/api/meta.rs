//! Small static endpoints: health, ping, trending searches, and the
//! USD to KWD reference rate.

use axum::{http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fixed reference rate shown next to KWD prices.
const USD_TO_KWD: f64 = 0.31;

const TRENDING: [&str; 9] = [
    "iPhone 15 Pro",
    "Samsung Galaxy S24",
    "MacBook Air M3",
    "PlayStation 5",
    "AirPods Pro",
    "iPad Air",
    "Nintendo Switch OLED",
    "LG OLED TV",
    "Dyson V15",
];

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct HealthData {
    status: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct PingData {
    ok: bool,
    now: DateTime<Utc>,
    accept: String,
}

#[derive(Debug, Serialize)]
pub(super) struct TrendingData {
    trending: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub(super) struct CurrencyData {
    rate: f64,
    timestamp: DateTime<Utc>,
    base: &'static str,
    target: &'static str,
}

pub(super) async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}

pub(super) async fn ping(headers: HeaderMap) -> Json<PingData> {
    let accept = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(PingData {
        ok: true,
        now: Utc::now(),
        accept,
    })
}

pub(super) async fn trending() -> Json<TrendingData> {
    Json(TrendingData {
        trending: TRENDING.to_vec(),
    })
}

pub(super) async fn currency() -> Json<CurrencyData> {
    Json(CurrencyData {
        rate: USD_TO_KWD,
        timestamp: Utc::now(),
        base: "USD",
        target: "KWD",
    })
}
