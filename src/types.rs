use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// An independently tracked group of stock categories. Each family has its own
/// persisted snapshot table, its own poll loop and its own notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Main,
    NightBlood,
}

impl Family {
    /// The fixed category set a family covers. A snapshot for a family always
    /// carries exactly these categories — absent upstream data means an empty
    /// sequence, never "unknown".
    pub fn categories(self) -> &'static [Category] {
        match self {
            Family::Main => &[Category::Seed, Category::Gear, Category::Egg],
            Family::NightBlood => &[Category::Night, Category::Blood],
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Family::Main => "main",
            Family::NightBlood => "night_blood",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A partition of inventory items within a family. The derive order doubles as
/// the fixed display order in notifications.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Seed,
    Gear,
    Egg,
    Night,
    Blood,
    Cosmetic,
}

impl Category {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "seed" => Some(Category::Seed),
            "gear" => Some(Category::Gear),
            "egg" => Some(Category::Egg),
            "night" => Some(Category::Night),
            "blood" => Some(Category::Blood),
            "cosmetic" => Some(Category::Cosmetic),
            _ => None,
        }
    }

    /// Section title used by the notification composer.
    pub fn section_title(self) -> &'static str {
        match self {
            Category::Seed => "🌱 SEEDS STOCK",
            Category::Gear => "🛠️ GEAR STOCK",
            Category::Egg => "🐣 EGG STOCK",
            Category::Night => "🌙 NIGHT STOCK",
            Category::Blood => "🩸 BLOOD STOCK",
            Category::Cosmetic => "💄 COSMETICS STOCK",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Seed => "seed",
            Category::Gear => "gear",
            Category::Egg => "egg",
            Category::Night => "night",
            Category::Blood => "blood",
            Category::Cosmetic => "cosmetic",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Stock items and snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub category: Category,
    /// Join key against the mention-group and icon tables. Derived from the
    /// display name when the feed does not supply one.
    pub item_id: String,
    pub display_name: String,
    pub quantity: u32,
}

/// The complete set of items across all categories of one family at one point
/// in time. Item order within a category is preserved as received from the
/// feed — reordering counts as a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub family: Family,
    categories: BTreeMap<Category, Vec<StockItem>>,
}

impl StockSnapshot {
    /// A snapshot with every category of `family` present and empty.
    pub fn empty(family: Family) -> Self {
        let categories = family
            .categories()
            .iter()
            .map(|&c| (c, Vec::new()))
            .collect();
        Self { family, categories }
    }

    /// Appends an item to its category's sequence. Items in categories outside
    /// the family's fixed set are dropped.
    pub fn push(&mut self, item: StockItem) {
        if let Some(items) = self.categories.get_mut(&item.category) {
            items.push(item);
        }
    }

    pub fn items(&self, category: Category) -> &[StockItem] {
        self.categories.get(&category).map_or(&[], Vec::as_slice)
    }

    /// All items across all categories, in display order.
    pub fn iter_items(&self) -> impl Iterator<Item = &StockItem> {
        self.categories.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    pub fn item_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Normalizes a display name into an item id: lowercase, whitespace runs
/// collapsed to a single underscore. `"Orange Tulip"` → `"orange_tulip"`.
pub fn normalize_item_id(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

// ---------------------------------------------------------------------------
// Composed notification message
// ---------------------------------------------------------------------------

/// One rendered category block: a title plus one line per item
/// (`<icon> <display_name> x<quantity>`), or the literal "None" placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSection {
    pub title: String,
    pub lines: Vec<String>,
}

/// Structured notification built by the composer. Dispatch to the sink is a
/// separate, explicit step so composition can be tested without a live sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockMessage {
    /// Space-joined mention-group identifiers for every qualifying item.
    pub mention_line: String,
    pub sections: Vec<MessageSection>,
}
