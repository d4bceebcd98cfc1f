/// Database row types used by sqlx for typed queries.
///
/// One row per stock item. Reads order by the rowid, which is how
/// within-category item order survives a round trip.
#[derive(Debug, sqlx::FromRow)]
pub struct StockRow {
    pub category: String,
    pub item_id: String,
    pub display_name: String,
    pub quantity: i64,
}
