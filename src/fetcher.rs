use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{Config, FETCH_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::{normalize_item_id, Category, Family, StockItem, StockSnapshot};

// ---------------------------------------------------------------------------
// Raw feed document
// ---------------------------------------------------------------------------

/// One item as published by the feed. The upstream has used both
/// `name`/`value` and `display_name`/`quantity` shapes; aliases accept either.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStockItem {
    #[serde(alias = "display_name")]
    pub name: String,
    #[serde(default, alias = "quantity")]
    pub value: i64,
    /// Supplied by some feed versions; derived from `name` when absent.
    #[serde(default)]
    pub item_id: Option<String>,
}

/// The feed's full document across both families. A category the feed omits
/// deserializes as an empty list — "no items", never "unknown".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStockDocument {
    #[serde(default, alias = "seed", alias = "seedsStock")]
    pub seed_stock: Vec<RawStockItem>,
    #[serde(default, alias = "gear", alias = "gearStock")]
    pub gear_stock: Vec<RawStockItem>,
    #[serde(default, alias = "egg", alias = "eggStock")]
    pub egg_stock: Vec<RawStockItem>,
    #[serde(default, alias = "night", alias = "nightStock")]
    pub night_stock: Vec<RawStockItem>,
    #[serde(default, alias = "blood", alias = "bloodStock")]
    pub blood_stock: Vec<RawStockItem>,
    #[serde(default, alias = "cosmetic", alias = "cosmeticsStock")]
    pub cosmetic_stock: Vec<RawStockItem>,
}

impl RawStockDocument {
    fn items_for(&self, category: Category) -> &[RawStockItem] {
        match category {
            Category::Seed => &self.seed_stock,
            Category::Gear => &self.gear_stock,
            Category::Egg => &self.egg_stock,
            Category::Night => &self.night_stock,
            Category::Blood => &self.blood_stock,
            Category::Cosmetic => &self.cosmetic_stock,
        }
    }
}

/// Maps the raw document into one family's normalized snapshot: item ids
/// derived from display names where missing, quantities clamped at zero,
/// categories outside the family ignored.
pub fn normalize_snapshot(doc: &RawStockDocument, family: Family) -> StockSnapshot {
    let mut snapshot = StockSnapshot::empty(family);
    for &category in family.categories() {
        for raw in doc.items_for(category) {
            let item_id = raw
                .item_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| normalize_item_id(&raw.name));
            snapshot.push(StockItem {
                category,
                item_id,
                display_name: raw.name.clone(),
                quantity: raw.value.max(0) as u32,
            });
        }
    }
    snapshot
}

// ---------------------------------------------------------------------------
// Feed fetcher
// ---------------------------------------------------------------------------

/// The upstream feed seam. The scheduler only ever sees this trait, so tests
/// can drive a poll cycle from canned documents.
#[async_trait]
pub trait StockFeed: Send + Sync {
    async fn fetch(&self) -> Result<RawStockDocument>;
}

/// Fetches the live feed over HTTP with a bounded timeout. A timeout or
/// non-success status is a fetch error; a body that is not the expected
/// structure is a parse error.
pub struct HttpStockFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpStockFeed {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: cfg.feed_url.clone(),
        })
    }
}

#[async_trait]
impl StockFeed for HttpStockFeed {
    async fn fetch(&self) -> Result<RawStockDocument> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("feed returned status {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            let snippet: String = body.chars().take(200).collect();
            AppError::Parse(format!("invalid feed body: {e}. Received: {snippet}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_camel_case_keys() {
        let doc: RawStockDocument =
            serde_json::from_str(r#"{"seed":[{"name":"Carrot","value":5}]}"#).unwrap();
        assert_eq!(doc.seed_stock.len(), 1);
        assert_eq!(doc.seed_stock[0].name, "Carrot");
        assert_eq!(doc.seed_stock[0].value, 5);

        let doc: RawStockDocument = serde_json::from_str(
            r#"{"seedsStock":[{"display_name":"Carrot","quantity":5}],"gearStock":[]}"#,
        )
        .unwrap();
        assert_eq!(doc.seed_stock.len(), 1);
        assert!(doc.gear_stock.is_empty());
    }

    #[test]
    fn normalize_derives_item_id_and_clamps_quantity() {
        let doc: RawStockDocument = serde_json::from_str(
            r#"{"seed":[{"name":"Orange Tulip","value":-3}],"gear":[{"name":"Trowel","value":2,"item_id":"trowel"}]}"#,
        )
        .unwrap();
        let snap = normalize_snapshot(&doc, Family::Main);
        let seeds = snap.items(Category::Seed);
        assert_eq!(seeds[0].item_id, "orange_tulip");
        assert_eq!(seeds[0].quantity, 0);
        assert_eq!(snap.items(Category::Gear)[0].item_id, "trowel");
    }

    #[test]
    fn missing_categories_normalize_to_empty() {
        let doc: RawStockDocument = serde_json::from_str("{}").unwrap();
        let snap = normalize_snapshot(&doc, Family::Main);
        assert_eq!(snap, StockSnapshot::empty(Family::Main));
    }

    #[test]
    fn night_blood_family_only_takes_its_categories() {
        let doc: RawStockDocument = serde_json::from_str(
            r#"{"seed":[{"name":"Carrot","value":5}],"night":[{"name":"Moonflower","value":1}]}"#,
        )
        .unwrap();
        let snap = normalize_snapshot(&doc, Family::NightBlood);
        assert_eq!(snap.item_count(), 1);
        assert_eq!(snap.items(Category::Night)[0].item_id, "moonflower");
    }
}
