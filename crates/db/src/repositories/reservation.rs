use async_trait::async_trait;
use sqlx::Row;

use maitred_core::domain::reservation::{Reservation, ReservationId, ReservationStatus};
use maitred_core::domain::user::UserId;

use super::{parse_status, RepositoryError, ReservationRepository};
use crate::DbPool;

pub struct SqlReservationRepository {
    pool: DbPool,
}

impl SqlReservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for SqlReservationRepository {
    async fn find_by_id(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let row = sqlx::query("SELECT id, user_id, status FROM reservations WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Reservation {
                id: ReservationId(row.get::<String, _>("id")),
                user_id: UserId(row.get::<String, _>("user_id")),
                status: parse_status(&row.get::<String, _>("status"))?,
            })
        })
        .transpose()
    }

    async fn insert(&self, reservation: Reservation) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO reservations (id, user_id, status) VALUES (?, ?, ?)")
            .bind(&reservation.id.0)
            .bind(&reservation.user_id.0)
            .bind(reservation.status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
