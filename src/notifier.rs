use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::types::{MessageSection, StockMessage, StockSnapshot};

/// Items in stock so often that pinging their mention groups is noise.
/// They still appear in the message body — only the mention line skips them.
const COMMON_ITEMS: &[&str] = &[
    "carrot",
    "strawberry",
    "blueberry",
    "tomato",
    "orange_tulip",
    "watering_can",
    "trowel",
    "common_egg",
];

pub fn is_common_item(item_id: &str) -> bool {
    COMMON_ITEMS.contains(&item_id)
}

/// Static item_id → icon lookup, with a generic crate as the fallback.
pub fn icon_for(item_id: &str) -> &'static str {
    match item_id {
        "carrot" => "🥕",
        "strawberry" => "🍓",
        "blueberry" => "🫐",
        "orange_tulip" => "🌷",
        "tomato" => "🍅",
        "corn" => "🌽",
        "daffodil" => "🌼",
        "watermelon" => "🍉",
        "pumpkin" => "🎃",
        "apple" => "🍎",
        "bamboo" => "🎋",
        "coconut" => "🥥",
        "cactus" => "🌵",
        "dragon_fruit" => "🐉",
        "mango" => "🥭",
        "grape" => "🍇",
        "mushroom" => "🍄",
        "pepper" => "🌶️",
        "beanstalk" => "🌿",
        "watering_can" => "🚿",
        "trowel" => "🛠️",
        "basic_sprinkler" | "advanced_sprinkler" | "godly_sprinkler" | "master_sprinkler" => "💦",
        "lightning_rod" => "⚡",
        "common_egg" | "uncommon_egg" | "rare_egg" | "legendary_egg" | "mythical_egg"
        | "bug_egg" => "🥚",
        _ => "📦",
    }
}

// ---------------------------------------------------------------------------
// Mention groups
// ---------------------------------------------------------------------------

/// item_id → external mention-group identifier. Items without an entry simply
/// produce no mention.
#[derive(Debug, Clone, Default)]
pub struct MentionTable {
    groups: HashMap<String, String>,
}

impl MentionTable {
    pub fn new(groups: HashMap<String, String>) -> Self {
        Self { groups }
    }

    /// Loads the table from a JSON object file (`{"carrot": "1377…", …}`).
    /// A missing file is an empty table, logged once — mentions are optional.
    pub fn from_path(path: &str) -> Self {
        if !Path::new(path).exists() {
            warn!("Mention table {path} not found — mention lines will be empty");
            return Self::default();
        }
        match std::fs::read_to_string(path)
            .map_err(AppError::from)
            .and_then(|s| serde_json::from_str(&s).map_err(AppError::from))
        {
            Ok(groups) => Self { groups },
            Err(e) => {
                warn!("Failed to load mention table {path}: {e}");
                Self::default()
            }
        }
    }

    pub fn group_for(&self, item_id: &str) -> Option<&str> {
        self.groups.get(item_id).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Builds the structured notification for a snapshot. Pure — dispatch to the
/// sink is the caller's explicit next step.
pub struct Composer {
    mentions: MentionTable,
}

impl Composer {
    pub fn new(mentions: MentionTable) -> Self {
        Self { mentions }
    }

    pub fn compose(&self, snapshot: &StockSnapshot) -> StockMessage {
        let sections = snapshot
            .family
            .categories()
            .iter()
            .map(|&category| {
                let lines: Vec<String> = snapshot
                    .items(category)
                    .iter()
                    .map(|item| {
                        format!(
                            "{} {} x{}",
                            icon_for(&item.item_id),
                            item.display_name,
                            item.quantity
                        )
                    })
                    .collect();
                MessageSection {
                    title: category.section_title().to_string(),
                    lines: if lines.is_empty() {
                        vec!["None".to_string()]
                    } else {
                        lines
                    },
                }
            })
            .collect();

        // One mention per qualifying item, deliberately not deduplicated.
        let mention_line = snapshot
            .iter_items()
            .filter(|item| !is_common_item(&item.item_id))
            .filter_map(|item| self.mentions.group_for(&item.item_id))
            .map(|group| format!("<@&{group}>"))
            .collect::<Vec<_>>()
            .join(" ");

        StockMessage {
            mention_line,
            sections,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification sink
// ---------------------------------------------------------------------------

/// Delivery seam. Fire-and-forget from the scheduler's perspective — a failed
/// send is reported, never retried here.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, channel_id: &str, message: &StockMessage) -> Result<()>;
}

/// Posts the composed message to a Discord-style webhook: the mention line as
/// content, one embed field per section.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, channel_id: &str, message: &StockMessage) -> Result<()> {
        let fields: Vec<serde_json::Value> = message
            .sections
            .iter()
            .map(|s| {
                json!({
                    "name": s.title,
                    "value": s.lines.join("\n"),
                    "inline": true,
                })
            })
            .collect();

        let payload = json!({
            "content": message.mention_line,
            "channel_id": channel_id,
            "embeds": [{
                "author": { "name": "🌦️ GardenBot • Grow a Garden Stocks" },
                "color": 0x2ecc71,
                "fields": fields,
            }],
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Sink(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Sink(format!("webhook returned status {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Family, StockItem, StockSnapshot};

    fn item(category: Category, name: &str, quantity: u32) -> StockItem {
        StockItem {
            category,
            item_id: crate::types::normalize_item_id(name),
            display_name: name.to_string(),
            quantity,
        }
    }

    fn table(entries: &[(&str, &str)]) -> MentionTable {
        MentionTable::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn sections_render_known_icons_and_placeholder() {
        let mut snap = StockSnapshot::empty(Family::Main);
        snap.push(item(Category::Seed, "Carrot", 5));
        snap.push(item(Category::Seed, "Mystery Root", 1));

        let msg = Composer::new(MentionTable::default()).compose(&snap);
        assert_eq!(msg.sections.len(), 3);
        assert_eq!(msg.sections[0].title, "🌱 SEEDS STOCK");
        assert_eq!(msg.sections[0].lines[0], "🥕 Carrot x5");
        assert_eq!(msg.sections[0].lines[1], "📦 Mystery Root x1");
    }

    #[test]
    fn empty_category_renders_none_placeholder() {
        let mut snap = StockSnapshot::empty(Family::Main);
        snap.push(item(Category::Seed, "Carrot", 5));

        let msg = Composer::new(MentionTable::default()).compose(&snap);
        // Gear and egg have no items — both show the literal placeholder.
        assert_eq!(msg.sections[1].lines, vec!["None".to_string()]);
        assert_eq!(msg.sections[2].lines, vec!["None".to_string()]);
    }

    #[test]
    fn mention_line_skips_common_items_and_unmapped_items() {
        let mut snap = StockSnapshot::empty(Family::Main);
        snap.push(item(Category::Seed, "Carrot", 5)); // common — skipped
        snap.push(item(Category::Seed, "Beanstalk", 1)); // mapped
        snap.push(item(Category::Gear, "Mystery Gadget", 1)); // unmapped

        let composer = Composer::new(table(&[("beanstalk", "111"), ("carrot", "222")]));
        let msg = composer.compose(&snap);
        assert_eq!(msg.mention_line, "<@&111>");
    }

    #[test]
    fn mention_line_is_not_deduplicated() {
        let mut snap = StockSnapshot::empty(Family::Main);
        snap.push(item(Category::Seed, "Beanstalk", 1));
        snap.push(item(Category::Gear, "Master Sprinkler", 1));

        // Two qualifying items pointing at the same group mention it twice.
        let composer = Composer::new(table(&[
            ("beanstalk", "999"),
            ("master_sprinkler", "999"),
        ]));
        let msg = composer.compose(&snap);
        assert_eq!(msg.mention_line, "<@&999> <@&999>");
    }
}
