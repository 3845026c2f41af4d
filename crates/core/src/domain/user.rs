use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::reservation::ReservationId;
use crate::domain::restaurant::{RestaurantId, TableId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Denormalized copy of a reservation kept on the user profile. The flat
/// reservation record stays authoritative for status; this is the
/// read-optimized view the original data layout carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub reservation_id: ReservationId,
    pub restaurant_id: RestaurantId,
    pub restaurant_name: String,
    pub table_id: TableId,
    pub table_price: Decimal,
    pub party_size: u32,
    pub slot: DateTime<Utc>,
    pub prebooked_meals: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub phone: String,
    pub email: String,
    pub reservations: Vec<ReservationSummary>,
}

impl User {
    /// Lazy-created users get a derived contact email; there is no signup
    /// flow in front of the engine.
    pub fn with_derived_email(id: UserId, phone: String) -> Self {
        let email = format!("{}@example.com", id.0.to_lowercase());
        Self { id, phone, email, reservations: Vec::new() }
    }

    pub fn summary_for(&self, reservation_id: &ReservationId) -> Option<&ReservationSummary> {
        self.reservations.iter().find(|summary| &summary.reservation_id == reservation_id)
    }
}
