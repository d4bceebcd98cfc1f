mod api;
mod config;
mod db;
mod detector;
mod error;
mod fetcher;
mod notifier;
mod restock_clock;
mod scheduler;
mod status;
mod types;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::StockStore;
use crate::error::Result;
use crate::fetcher::HttpStockFeed;
use crate::notifier::{Composer, MentionTable, WebhookSink};
use crate::scheduler::{PollPlan, PollScheduler};
use crate::status::LastFetchStatus;
use crate::types::Family;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = SqlitePoolOptions::new()
        .connect(&format!("sqlite:{}?mode=rwc", cfg.db_path))
        .await?;
    let store = StockStore::new(pool);
    store.init_schema().await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Static lookup tables ---
    let mentions = MentionTable::from_path(&cfg.role_map_path);

    // --- Last-fetch status, one holder per family ---
    let main_status = LastFetchStatus::new();
    let night_blood_status = LastFetchStatus::new();

    // --- Main family poll loop (seed/gear/egg, 5-minute boundaries) ---
    let main_scheduler = PollScheduler::new(
        Family::Main,
        PollPlan::main(),
        HttpStockFeed::new(&cfg)?,
        WebhookSink::new(cfg.stock_webhook_url.clone())?,
        store.clone(),
        Composer::new(mentions.clone()),
        cfg.channel_id.clone(),
        main_status.clone(),
    );
    tokio::spawn(async move { main_scheduler.run().await });
    info!("Main stock poll loop armed (5m boundaries)");

    // --- Night/blood poll loop (hour boundaries), independent state ---
    let night_blood_scheduler = PollScheduler::new(
        Family::NightBlood,
        PollPlan::night_blood(),
        HttpStockFeed::new(&cfg)?,
        WebhookSink::new(cfg.night_blood_webhook_url.clone())?,
        store.clone(),
        Composer::new(mentions),
        cfg.night_blood_channel_id.clone(),
        night_blood_status.clone(),
    );
    tokio::spawn(async move { night_blood_scheduler.run().await });
    info!("Night/blood poll loop armed (1h boundaries)");

    // --- HTTP status surface ---
    let api_state = ApiState {
        store,
        main_status,
        night_blood_status,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
