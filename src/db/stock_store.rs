use sqlx::SqlitePool;

use crate::db::models::StockRow;
use crate::error::Result;
use crate::types::{Category, Family, StockItem, StockSnapshot};

/// Persistent store holding the single latest accepted snapshot per family.
///
/// The two families live in disjoint tables, so a replace on one never
/// touches the other. A replace is delete-then-insert inside one transaction:
/// a reader either sees the full previous snapshot or the full new one, never
/// a mix, and a failed transaction leaves the previous snapshot intact.
#[derive(Clone)]
pub struct StockStore {
    pool: SqlitePool,
}

fn table(family: Family) -> &'static str {
    match family {
        Family::Main => "current_stock",
        Family::NightBlood => "night_blood_stock",
    }
}

impl StockStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates both family tables if absent. Called once at startup.
    pub async fn init_schema(&self) -> Result<()> {
        for family in [Family::Main, Family::NightBlood] {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category TEXT NOT NULL,
                    item_id TEXT NOT NULL,
                    display_name TEXT NOT NULL,
                    quantity INTEGER NOT NULL
                )
                "#,
                table(family)
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Reads the persisted snapshot for a family. Rows come back in insertion
    /// order (rowid), preserving within-category item order. An empty table
    /// yields an empty snapshot, never an error.
    pub async fn read_snapshot(&self, family: Family) -> Result<StockSnapshot> {
        let sql = format!(
            "SELECT category, item_id, display_name, quantity FROM {} ORDER BY id",
            table(family)
        );
        let rows: Vec<StockRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        let mut snapshot = StockSnapshot::empty(family);
        for row in rows {
            let Some(category) = Category::from_str(&row.category) else {
                continue;
            };
            snapshot.push(StockItem {
                category,
                item_id: row.item_id,
                display_name: row.display_name,
                quantity: row.quantity.max(0) as u32,
            });
        }
        Ok(snapshot)
    }

    /// Atomically replaces a family's snapshot: delete all rows, insert every
    /// item of `snapshot`, commit. On any error the transaction rolls back and
    /// the prior snapshot stays observable.
    pub async fn replace_snapshot(&self, family: Family, snapshot: &StockSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let delete_sql = format!("DELETE FROM {}", table(family));
        sqlx::query(&delete_sql).execute(&mut *tx).await?;

        let insert_sql = format!(
            "INSERT INTO {} (category, item_id, display_name, quantity) VALUES (?, ?, ?, ?)",
            table(family)
        );
        for item in snapshot.iter_items() {
            sqlx::query(&insert_sql)
                .bind(item.category.to_string())
                .bind(&item.item_id)
                .bind(&item.display_name)
                .bind(i64::from(item.quantity))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> StockStore {
        // One connection — a fresh :memory: connection would otherwise see a
        // distinct empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = StockStore::new(pool);
        store.init_schema().await.unwrap();
        store
    }

    fn item(category: Category, name: &str, quantity: u32) -> StockItem {
        StockItem {
            category,
            item_id: crate::types::normalize_item_id(name),
            display_name: name.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn replace_then_read_round_trips() {
        let store = test_store().await;

        let mut snap = StockSnapshot::empty(Family::Main);
        snap.push(item(Category::Seed, "Carrot", 5));
        snap.push(item(Category::Seed, "Orange Tulip", 8));
        snap.push(item(Category::Gear, "Watering Can", 1));

        store.replace_snapshot(Family::Main, &snap).await.unwrap();
        let read = store.read_snapshot(Family::Main).await.unwrap();
        assert_eq!(read, snap);
    }

    #[tokio::test]
    async fn replace_overwrites_wholesale() {
        let store = test_store().await;

        let mut first = StockSnapshot::empty(Family::Main);
        first.push(item(Category::Seed, "Carrot", 5));
        first.push(item(Category::Egg, "Common Egg", 3));
        store.replace_snapshot(Family::Main, &first).await.unwrap();

        let mut second = StockSnapshot::empty(Family::Main);
        second.push(item(Category::Gear, "Trowel", 2));
        store.replace_snapshot(Family::Main, &second).await.unwrap();

        let read = store.read_snapshot(Family::Main).await.unwrap();
        assert_eq!(read, second);
        assert!(read.items(Category::Seed).is_empty());
        assert!(read.items(Category::Egg).is_empty());
    }

    #[tokio::test]
    async fn families_use_disjoint_storage() {
        let store = test_store().await;

        let mut main = StockSnapshot::empty(Family::Main);
        main.push(item(Category::Seed, "Carrot", 5));
        store.replace_snapshot(Family::Main, &main).await.unwrap();

        let mut night = StockSnapshot::empty(Family::NightBlood);
        night.push(item(Category::Night, "Moonflower", 2));
        store.replace_snapshot(Family::NightBlood, &night).await.unwrap();

        // Replacing the night/blood family with an empty snapshot leaves main alone.
        store
            .replace_snapshot(Family::NightBlood, &StockSnapshot::empty(Family::NightBlood))
            .await
            .unwrap();

        assert_eq!(store.read_snapshot(Family::Main).await.unwrap(), main);
        assert!(store
            .read_snapshot(Family::NightBlood)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn empty_table_reads_as_empty_snapshot() {
        let store = test_store().await;
        let read = store.read_snapshot(Family::Main).await.unwrap();
        assert_eq!(read, StockSnapshot::empty(Family::Main));
    }
}
