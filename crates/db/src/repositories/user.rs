use async_trait::async_trait;
use sqlx::Row;

use maitred_core::domain::reservation::ReservationId;
use maitred_core::domain::restaurant::{RestaurantId, TableId};
use maitred_core::domain::user::{ReservationSummary, User, UserId};

use super::{format_slot, parse_price, parse_slot, RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_meals(&self, reservation_id: &str) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT meal_name FROM prebooked_meals \
             WHERE reservation_id = ? ORDER BY position",
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get::<String, _>("meal_name")).collect())
    }

    async fn summary_from_row(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<ReservationSummary, RepositoryError> {
        let reservation_id = row.get::<String, _>("reservation_id");
        Ok(ReservationSummary {
            prebooked_meals: self.load_meals(&reservation_id).await?,
            reservation_id: ReservationId(reservation_id),
            restaurant_id: RestaurantId(row.get::<String, _>("restaurant_id")),
            restaurant_name: row.get::<String, _>("restaurant_name"),
            table_id: TableId(row.get::<String, _>("table_id")),
            table_price: parse_price(&row.get::<String, _>("table_price"))?,
            party_size: row.get::<i64, _>("party_size") as u32,
            slot: parse_slot(&row.get::<String, _>("slot"))?,
        })
    }
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, phone, email FROM users WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let summary_rows = sqlx::query(
            "SELECT reservation_id, restaurant_id, restaurant_name, table_id, \
                    table_price, party_size, slot \
             FROM user_reservations WHERE user_id = ? ORDER BY position",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut reservations = Vec::with_capacity(summary_rows.len());
        for summary_row in &summary_rows {
            reservations.push(self.summary_from_row(summary_row).await?);
        }

        Ok(Some(User {
            id: UserId(row.get::<String, _>("id")),
            phone: row.get::<String, _>("phone"),
            email: row.get::<String, _>("email"),
            reservations,
        }))
    }

    async fn upsert(&self, user: User) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO users (id, phone, email) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&user.id.0)
        .bind(&user.phone)
        .bind(&user.email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_reservation(
        &self,
        user_id: &UserId,
        summary: ReservationSummary,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_reservations \
             (reservation_id, user_id, restaurant_id, restaurant_name, table_id, \
              table_price, party_size, slot, position) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, \
                     (SELECT COUNT(*) FROM user_reservations WHERE user_id = ?))",
        )
        .bind(&summary.reservation_id.0)
        .bind(&user_id.0)
        .bind(&summary.restaurant_id.0)
        .bind(&summary.restaurant_name)
        .bind(&summary.table_id.0)
        .bind(summary.table_price.to_string())
        .bind(summary.party_size as i64)
        .bind(format_slot(summary.slot))
        .bind(&user_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_reservation_summary(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
    ) -> Result<Option<ReservationSummary>, RepositoryError> {
        let row = sqlx::query(
            "SELECT reservation_id, restaurant_id, restaurant_name, table_id, \
                    table_price, party_size, slot \
             FROM user_reservations WHERE user_id = ? AND reservation_id = ?",
        )
        .bind(&user_id.0)
        .bind(&reservation_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.summary_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn append_prebooked_meal(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
        meal_name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO prebooked_meals (reservation_id, position, meal_name) \
             SELECT ?, (SELECT COUNT(*) FROM prebooked_meals WHERE reservation_id = ?), ? \
             WHERE EXISTS ( \
                 SELECT 1 FROM user_reservations \
                 WHERE reservation_id = ? AND user_id = ?)",
        )
        .bind(&reservation_id.0)
        .bind(&reservation_id.0)
        .bind(meal_name)
        .bind(&reservation_id.0)
        .bind(&user_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use maitred_core::domain::reservation::ReservationId;
    use maitred_core::domain::restaurant::{RestaurantId, TableId};
    use maitred_core::domain::user::{ReservationSummary, User, UserId};

    use super::SqlUserRepository;
    use crate::repositories::UserRepository;
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlUserRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlUserRepository::new(pool)
    }

    fn summary(reservation_id: &str) -> ReservationSummary {
        ReservationSummary {
            reservation_id: ReservationId(reservation_id.to_string()),
            restaurant_id: RestaurantId("R1".to_string()),
            restaurant_name: "Maison Lumiere".to_string(),
            table_id: TableId("T2".to_string()),
            table_price: Decimal::new(800, 2),
            party_size: 4,
            slot: Utc.with_ymd_and_hms(2025, 5, 20, 19, 0, 0).unwrap(),
            prebooked_meals: Vec::new(),
        }
    }

    #[tokio::test]
    async fn upsert_is_insert_if_absent() {
        let repo = repo().await;
        let user = User::with_derived_email(UserId("U1".to_string()), "+15550100".to_string());
        repo.upsert(user.clone()).await.expect("insert");

        let replay =
            User::with_derived_email(UserId("U1".to_string()), "+15550199".to_string());
        repo.upsert(replay).await.expect("second upsert is a no-op");

        let found = repo.find_by_id(&user.id).await.expect("query").expect("present");
        assert_eq!(found.phone, "+15550100", "existing profile left untouched");
    }

    #[tokio::test]
    async fn summaries_come_back_in_append_order_with_meals() {
        let repo = repo().await;
        let user_id = UserId("U1".to_string());
        repo.upsert(User::with_derived_email(user_id.clone(), "+15550100".to_string()))
            .await
            .expect("insert user");

        repo.append_reservation(&user_id, summary("RES-a")).await.expect("append a");
        repo.append_reservation(&user_id, summary("RES-b")).await.expect("append b");
        repo.append_prebooked_meal(&user_id, &ReservationId("RES-a".to_string()), "Coq au Vin")
            .await
            .expect("meal 1");
        repo.append_prebooked_meal(&user_id, &ReservationId("RES-a".to_string()), "Creme Brulee")
            .await
            .expect("meal 2");

        let user = repo.find_by_id(&user_id).await.expect("query").expect("present");
        let ids: Vec<&str> =
            user.reservations.iter().map(|s| s.reservation_id.0.as_str()).collect();
        assert_eq!(ids, ["RES-a", "RES-b"]);
        assert_eq!(user.reservations[0].prebooked_meals, ["Coq au Vin", "Creme Brulee"]);
        assert!(user.reservations[1].prebooked_meals.is_empty());
    }

    #[tokio::test]
    async fn summary_lookup_is_scoped_to_the_owning_user() {
        let repo = repo().await;
        let owner = UserId("U1".to_string());
        let other = UserId("U2".to_string());
        repo.upsert(User::with_derived_email(owner.clone(), "+15550100".to_string()))
            .await
            .expect("insert owner");
        repo.upsert(User::with_derived_email(other.clone(), "+15550101".to_string()))
            .await
            .expect("insert other");
        repo.append_reservation(&owner, summary("RES-a")).await.expect("append");

        let reservation_id = ReservationId("RES-a".to_string());
        assert!(repo
            .find_reservation_summary(&owner, &reservation_id)
            .await
            .expect("query")
            .is_some());
        assert!(repo
            .find_reservation_summary(&other, &reservation_id)
            .await
            .expect("query")
            .is_none());
    }
}
