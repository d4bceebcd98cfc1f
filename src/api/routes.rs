//! Read-only status surface. Every endpoint is a pure projection — current
//! snapshot, restock windows, last-fetch outcome — with no mutation path.
//! Routes are declared statically here; handlers never register themselves.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::db::StockStore;
use crate::error::AppError;
use crate::restock_clock::{category_interval, compute_restock_window, format_clock_time};
use crate::status::{FetchStatus, LastFetchStatus};
use crate::types::{Category, Family, StockSnapshot};

#[derive(Clone)]
pub struct ApiState {
    pub store: StockStore,
    pub main_status: LastFetchStatus,
    pub night_blood_status: LastFetchStatus,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/stock/current", get(get_current_stock))
        .route("/api/stock/restock-time", get(get_restock_time))
        .route("/api/stock/last-fetch", get(get_last_fetch))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param / response structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CurrentStockQuery {
    pub family: Option<String>,
}

#[derive(Serialize)]
pub struct RestockTimeEntry {
    /// Unix millisecond timestamp of the next reset.
    pub timestamp: i64,
    pub countdown: String,
    pub last_restock: String,
    pub time_since_last_restock: String,
}

#[derive(Serialize)]
pub struct LastFetchResponse {
    pub main: FetchStatus,
    pub night_blood: FetchStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_current_stock(
    State(state): State<ApiState>,
    Query(params): Query<CurrentStockQuery>,
) -> Result<Json<StockSnapshot>, AppError> {
    let family = match params.family.as_deref() {
        None | Some("main") => Family::Main,
        Some("night_blood") => Family::NightBlood,
        Some(other) => {
            return Err(AppError::Config(format!("unknown family: {other}")));
        }
    };
    let snapshot = state.store.read_snapshot(family).await?;
    Ok(Json(snapshot))
}

async fn get_restock_time() -> Json<BTreeMap<String, RestockTimeEntry>> {
    Json(restock_overview(Local::now().naive_local()))
}

async fn get_last_fetch(State(state): State<ApiState>) -> Json<LastFetchResponse> {
    Json(LastFetchResponse {
        main: state.main_status.get(),
        night_blood: state.night_blood_status.get(),
    })
}

/// One restock window entry per category. Seeds and gear share an interval and
/// therefore report the same window, as do night and blood.
fn restock_overview(now: NaiveDateTime) -> BTreeMap<String, RestockTimeEntry> {
    let categories = [
        Category::Seed,
        Category::Gear,
        Category::Egg,
        Category::Night,
        Category::Blood,
        Category::Cosmetic,
    ];

    categories
        .iter()
        .map(|&category| {
            let window = compute_restock_window(category_interval(category), now);
            let entry = RestockTimeEntry {
                timestamp: epoch_millis(window.next_reset),
                countdown: window.countdown_string(),
                last_restock: format_clock_time(window.last_reset),
                time_since_last_restock: window.time_since_string(),
            };
            (category.to_string(), entry)
        })
        .collect()
}

fn epoch_millis(t: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&t)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_default()
}
