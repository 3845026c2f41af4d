use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use maitred_core::domain::menu::MenuItem;
use maitred_core::domain::reservation::{Reservation, ReservationId, ReservationStatus};
use maitred_core::domain::restaurant::{Restaurant, RestaurantId, Table, TableId};
use maitred_core::domain::user::{ReservationSummary, User, UserId};

pub mod memory;
pub mod menu;
pub mod reservation;
pub mod restaurant;
pub mod user;

pub use memory::{
    InMemoryMenuRepository, InMemoryReservationRepository, InMemoryRestaurantRepository,
    InMemoryUserRepository,
};
pub use menu::SqlMenuRepository;
pub use reservation::SqlReservationRepository;
pub use restaurant::SqlRestaurantRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Accessors for the restaurant/table/slot side of the inventory.
///
/// `try_reserve_slot` is the single serialization point for slot contention:
/// it must never let two concurrent callers both flip one (table, slot) pair
/// from available to booked.
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn find_by_id(&self, id: &RestaurantId) -> Result<Option<Restaurant>, RepositoryError>;

    /// Case-insensitive substring filters; an absent filter matches all.
    /// `min_capacity` keeps restaurants that have at least one table seating
    /// that many. Results come back in stable storage order.
    async fn find_matching(
        &self,
        cuisine: Option<&str>,
        location: Option<&str>,
        min_capacity: Option<u32>,
    ) -> Result<Vec<Restaurant>, RepositoryError>;

    /// Atomically claims the first table (storage order) at/above
    /// `party_size` with `slot` still available, returning the claimed
    /// table, or `None` when every candidate is taken.
    async fn try_reserve_slot(
        &self,
        restaurant_id: &RestaurantId,
        slot: DateTime<Utc>,
        party_size: u32,
    ) -> Result<Option<Table>, RepositoryError>;

    /// Idempotent: releasing an already-available slot is a no-op.
    async fn release_slot(
        &self,
        restaurant_id: &RestaurantId,
        table_id: &TableId,
        slot: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn list_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<MenuItem>, RepositoryError>;

    /// Case-insensitive substring match; ties broken by first match in
    /// storage order.
    async fn find_item_fuzzy(
        &self,
        restaurant_id: &RestaurantId,
        name: &str,
    ) -> Result<Option<MenuItem>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Insert-if-absent; an existing profile is left untouched.
    async fn upsert(&self, user: User) -> Result<(), RepositoryError>;

    async fn append_reservation(
        &self,
        user_id: &UserId,
        summary: ReservationSummary,
    ) -> Result<(), RepositoryError>;

    async fn find_reservation_summary(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
    ) -> Result<Option<ReservationSummary>, RepositoryError>;

    async fn append_prebooked_meal(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
        meal_name: &str,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_by_id(&self, id: &ReservationId)
        -> Result<Option<Reservation>, RepositoryError>;

    async fn insert(&self, reservation: Reservation) -> Result<(), RepositoryError>;

    async fn set_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<(), RepositoryError>;
}

/// Canonical storage form for slots. Seed fixtures and every bound query
/// parameter go through this so string equality in SQL stays exact.
pub(crate) fn format_slot(slot: DateTime<Utc>) -> String {
    slot.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_slot(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid slot timestamp `{raw}`: {error}")))
}

pub(crate) fn parse_price(raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>()
        .map_err(|error| RepositoryError::Decode(format!("invalid price `{raw}`: {error}")))
}

pub(crate) fn parse_status(raw: &str) -> Result<ReservationStatus, RepositoryError> {
    raw.parse().map_err(RepositoryError::Decode)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{format_slot, parse_price, parse_slot};

    #[test]
    fn slot_storage_form_round_trips() {
        let slot = Utc.with_ymd_and_hms(2025, 5, 20, 19, 0, 0).unwrap();
        let stored = format_slot(slot);

        assert_eq!(stored, "2025-05-20T19:00:00Z");
        assert_eq!(parse_slot(&stored).expect("parse back"), slot);
    }

    #[test]
    fn malformed_slot_and_price_report_decode_errors() {
        assert!(parse_slot("next tuesday").is_err());
        assert!(parse_price("twelve dollars").is_err());
    }
}
