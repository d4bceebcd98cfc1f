use crate::error::{AppError, Result};

pub const FEED_URL: &str = "https://growagarden.gg/api/stock/GetStock";

/// Main family poll boundary: polls align to multiples of this period,
/// counted from local midnight.
pub const POLL_PERIOD_SECS: u64 = 5 * 60;

/// Intra-boundary offset (seconds past the aligned boundary) so the upstream
/// source has finished its own refresh before we fetch.
pub const POLL_BOUNDARY_OFFSET_SECS: u64 = 8;

/// Additional settle buffer slept after the timer fires, before fetching.
pub const POLL_SETTLE_BUFFER_SECS: u64 = 12;

/// Night/blood family polls on hour boundaries with a short grace offset.
pub const NIGHT_BLOOD_PERIOD_SECS: u64 = 3600;
pub const NIGHT_BLOOD_OFFSET_SECS: u64 = 15;

/// Fallback delay when the computed boundary has already passed
/// (scheduling jitter) — never fire immediately, never stall.
pub const DEFAULT_POLL_DELAY_SECS: u64 = 5 * 60;

/// Bounded timeout on the feed fetch. Exceeding it is a fetch failure,
/// not a hang.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Restock interval lengths per category (seconds).
pub mod restock_intervals {
    pub const SEED_GEAR_SECS: u64 = 5 * 60;
    pub const EGG_SECS: u64 = 30 * 60;
    pub const NIGHT_BLOOD_SECS: u64 = 3600;
    pub const COSMETIC_SECS: u64 = 4 * 3600;
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream stock feed endpoint (FEED_URL)
    pub feed_url: String,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Webhook endpoint for main-family notifications (STOCK_WEBHOOK_URL)
    pub stock_webhook_url: String,
    /// Webhook endpoint for night/blood notifications (NIGHT_BLOOD_WEBHOOK_URL).
    /// Falls back to the main webhook when unset.
    pub night_blood_webhook_url: String,
    /// Target channel id forwarded to the sink (CHANNEL_ID)
    pub channel_id: String,
    /// Target channel id for the night/blood family (NIGHT_BLOOD_CHANNEL_ID)
    pub night_blood_channel_id: String,
    /// Path to the item_id → mention-group JSON table (ROLE_MAP_PATH)
    pub role_map_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let stock_webhook_url = std::env::var("STOCK_WEBHOOK_URL")
            .map_err(|_| AppError::Config("STOCK_WEBHOOK_URL must be set".to_string()))?;
        Ok(Self {
            feed_url: std::env::var("FEED_URL").unwrap_or_else(|_| FEED_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "stock.sqlite".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| {
                    AppError::Config("API_PORT must be a valid port number".to_string())
                })?,
            night_blood_webhook_url: std::env::var("NIGHT_BLOOD_WEBHOOK_URL")
                .unwrap_or_else(|_| stock_webhook_url.clone()),
            stock_webhook_url,
            channel_id: std::env::var("CHANNEL_ID").unwrap_or_default(),
            night_blood_channel_id: std::env::var("NIGHT_BLOOD_CHANNEL_ID").unwrap_or_default(),
            role_map_path: std::env::var("ROLE_MAP_PATH")
                .unwrap_or_else(|_| "data/roleMap.json".to_string()),
        })
    }
}
