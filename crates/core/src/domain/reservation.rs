use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    /// Collision-resistant, never derived from the wall clock.
    pub fn generate() -> Self {
        Self(format!("RES-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "confirmed" => Ok(Self::Confirmed),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!("unknown reservation status `{other}`")),
        }
    }
}

/// Flat reservation record; the source of truth for status. An "update" is
/// always a cancel followed by a fresh reservation under a new id, never an
/// in-place edit of this record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn confirmed(id: ReservationId, user_id: UserId) -> Self {
        Self { id, user_id, status: ReservationStatus::Confirmed }
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!((self.status, next), (ReservationStatus::Confirmed, ReservationStatus::Canceled))
    }

    pub fn transition_to(&mut self, next: ReservationStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidReservationTransition { from: self.status, to: next })
    }
}
