//! Change detection between a freshly normalized snapshot and the persisted
//! one. Comparison is structural over the typed snapshot — field by field,
//! order-sensitive within a category — so key ordering in the upstream JSON
//! can never produce a false positive.

use crate::types::{StockItem, StockSnapshot};

/// Returns true when `new` differs from `old` anywhere: a category gained or
/// lost items, an item's name or quantity moved, or items within a category
/// were reordered. Two fully empty snapshots are unchanged, so an empty feed
/// against an empty first-run state stays quiet.
pub fn has_changed(new: &StockSnapshot, old: &StockSnapshot) -> bool {
    for &category in new.family.categories() {
        if !items_equal(new.items(category), old.items(category)) {
            return true;
        }
    }
    false
}

fn items_equal(a: &[StockItem], b: &[StockItem]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.item_id == y.item_id
                && x.display_name == y.display_name
                && x.quantity == y.quantity
        })
}
