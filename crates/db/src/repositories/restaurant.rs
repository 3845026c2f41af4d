use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use maitred_core::domain::restaurant::{
    Restaurant, RestaurantId, SlotAvailability, SlotStatus, Table, TableId,
};

use super::{format_slot, parse_price, parse_slot, RepositoryError, RestaurantRepository};
use crate::DbPool;

pub struct SqlRestaurantRepository {
    pool: DbPool,
}

impl SqlRestaurantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_tables(&self, restaurant_id: &RestaurantId) -> Result<Vec<Table>, RepositoryError> {
        let slot_rows = sqlx::query(
            "SELECT table_id, slot, status FROM table_slots \
             WHERE restaurant_id = ? ORDER BY rowid",
        )
        .bind(&restaurant_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut slots_by_table: HashMap<String, Vec<SlotAvailability>> = HashMap::new();
        for row in slot_rows {
            let table_id = row.get::<String, _>("table_id");
            let status = row
                .get::<String, _>("status")
                .parse::<SlotStatus>()
                .map_err(RepositoryError::Decode)?;
            slots_by_table.entry(table_id).or_default().push(SlotAvailability {
                slot: parse_slot(&row.get::<String, _>("slot"))?,
                status,
            });
        }

        let table_rows = sqlx::query(
            "SELECT table_id, capacity, price FROM restaurant_tables \
             WHERE restaurant_id = ? ORDER BY rowid",
        )
        .bind(&restaurant_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut tables = Vec::with_capacity(table_rows.len());
        for row in table_rows {
            let table_id = row.get::<String, _>("table_id");
            tables.push(Table {
                availability: slots_by_table.remove(&table_id).unwrap_or_default(),
                id: TableId(table_id),
                capacity: row.get::<i64, _>("capacity") as u32,
                price: parse_price(&row.get::<String, _>("price"))?,
            });
        }

        Ok(tables)
    }

    async fn load_table(
        &self,
        restaurant_id: &RestaurantId,
        table_id: &str,
    ) -> Result<Option<Table>, RepositoryError> {
        let tables = self.load_tables(restaurant_id).await?;
        Ok(tables.into_iter().find(|table| table.id.0 == table_id))
    }
}

#[async_trait]
impl RestaurantRepository for SqlRestaurantRepository {
    async fn find_by_id(&self, id: &RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, cuisine, location FROM restaurants WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Restaurant {
            id: RestaurantId(row.get::<String, _>("id")),
            name: row.get::<String, _>("name"),
            cuisine: row.get::<String, _>("cuisine"),
            location: row.get::<String, _>("location"),
            tables: self.load_tables(id).await?,
        }))
    }

    async fn find_matching(
        &self,
        cuisine: Option<&str>,
        location: Option<&str>,
        min_capacity: Option<u32>,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id FROM restaurants r \
             WHERE LOWER(r.cuisine) LIKE '%' || LOWER(?1) || '%' \
               AND LOWER(r.location) LIKE '%' || LOWER(?2) || '%' \
               AND (?3 <= 0 OR EXISTS ( \
                   SELECT 1 FROM restaurant_tables t \
                   WHERE t.restaurant_id = r.id AND t.capacity >= ?3)) \
             ORDER BY r.rowid",
        )
        .bind(cuisine.unwrap_or_default())
        .bind(location.unwrap_or_default())
        .bind(min_capacity.unwrap_or(0) as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut restaurants = Vec::with_capacity(rows.len());
        for row in rows {
            let id = RestaurantId(row.get::<String, _>("id"));
            if let Some(restaurant) = self.find_by_id(&id).await? {
                restaurants.push(restaurant);
            }
        }

        Ok(restaurants)
    }

    async fn try_reserve_slot(
        &self,
        restaurant_id: &RestaurantId,
        slot: DateTime<Utc>,
        party_size: u32,
    ) -> Result<Option<Table>, RepositoryError> {
        let stored_slot = format_slot(slot);
        let candidates = sqlx::query(
            "SELECT t.table_id FROM restaurant_tables t \
             JOIN table_slots s \
               ON s.restaurant_id = t.restaurant_id AND s.table_id = t.table_id \
             WHERE t.restaurant_id = ? AND t.capacity >= ? \
               AND s.slot = ? AND s.status = 'available' \
             ORDER BY t.rowid",
        )
        .bind(&restaurant_id.0)
        .bind(party_size as i64)
        .bind(&stored_slot)
        .fetch_all(&self.pool)
        .await?;

        // The conditional UPDATE is the compare-and-set: a candidate that a
        // concurrent caller already claimed affects zero rows and the scan
        // moves on to the next table in storage order.
        for candidate in candidates {
            let table_id = candidate.get::<String, _>("table_id");
            let claimed = sqlx::query(
                "UPDATE table_slots SET status = 'booked' \
                 WHERE restaurant_id = ? AND table_id = ? AND slot = ? \
                   AND status = 'available'",
            )
            .bind(&restaurant_id.0)
            .bind(&table_id)
            .bind(&stored_slot)
            .execute(&self.pool)
            .await?;

            if claimed.rows_affected() == 1 {
                return self.load_table(restaurant_id, &table_id).await;
            }
        }

        Ok(None)
    }

    async fn release_slot(
        &self,
        restaurant_id: &RestaurantId,
        table_id: &TableId,
        slot: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE table_slots SET status = 'available' \
             WHERE restaurant_id = ? AND table_id = ? AND slot = ?",
        )
        .bind(&restaurant_id.0)
        .bind(&table_id.0)
        .bind(format_slot(slot))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
