use async_trait::async_trait;
use sqlx::Row;

use maitred_core::domain::menu::{MenuItem, MenuItemId};
use maitred_core::domain::restaurant::RestaurantId;

use super::{parse_price, MenuRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMenuRepository {
    pool: DbPool,
}

impl SqlMenuRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn item_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MenuItem, RepositoryError> {
        Ok(MenuItem {
            id: MenuItemId(row.get::<String, _>("id")),
            restaurant_id: RestaurantId(row.get::<String, _>("restaurant_id")),
            name: row.get::<String, _>("name"),
            category: row.get::<String, _>("category"),
            price: parse_price(&row.get::<String, _>("price"))?,
            prebook_allowed: row.get::<i64, _>("prebook_allowed") != 0,
        })
    }
}

#[async_trait]
impl MenuRepository for SqlMenuRepository {
    async fn list_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, restaurant_id, name, category, price, prebook_allowed \
             FROM menu_items WHERE restaurant_id = ? ORDER BY rowid",
        )
        .bind(&restaurant_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::item_from_row).collect()
    }

    async fn find_item_fuzzy(
        &self,
        restaurant_id: &RestaurantId,
        name: &str,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, restaurant_id, name, category, price, prebook_allowed \
             FROM menu_items \
             WHERE restaurant_id = ? AND LOWER(name) LIKE '%' || LOWER(?) || '%' \
             ORDER BY rowid LIMIT 1",
        )
        .bind(&restaurant_id.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::item_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use maitred_core::domain::restaurant::RestaurantId;

    use super::SqlMenuRepository;
    use crate::repositories::MenuRepository;
    use crate::{connect_with_settings, fixtures::SeedDataset, migrations};

    async fn seeded_repo() -> SqlMenuRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SeedDataset::load(&pool).await.expect("seed");
        SqlMenuRepository::new(pool)
    }

    #[tokio::test]
    async fn listing_preserves_storage_order_and_prebook_flags() {
        let repo = seeded_repo().await;
        let menu =
            repo.list_for_restaurant(&RestaurantId("R1".to_string())).await.expect("query");

        let names: Vec<&str> = menu.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["Coq au Vin", "Croissant", "Creme Brulee"]);
        assert!(!menu[1].prebook_allowed, "croissant is not prebookable");
    }

    #[tokio::test]
    async fn listing_for_unknown_restaurant_is_empty() {
        let repo = seeded_repo().await;
        let menu =
            repo.list_for_restaurant(&RestaurantId("R99".to_string())).await.expect("query");
        assert!(menu.is_empty());
    }

    #[tokio::test]
    async fn fuzzy_lookup_ignores_case_and_takes_first_match() {
        let repo = seeded_repo().await;
        let restaurant_id = RestaurantId("R2".to_string());

        let item = repo
            .find_item_fuzzy(&restaurant_id, "TIRAMI")
            .await
            .expect("query")
            .expect("match");
        assert_eq!(item.name, "Tiramisu");

        // "pa" matches both mains; storage order decides.
        let first = repo
            .find_item_fuzzy(&restaurant_id, "pa")
            .await
            .expect("query")
            .expect("match");
        assert_eq!(first.name, "Pizza Margherita");

        assert!(repo
            .find_item_fuzzy(&restaurant_id, "pad thai")
            .await
            .expect("query")
            .is_none());
    }
}
