use thiserror::Error;

use crate::domain::reservation::ReservationStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid reservation transition from {from:?} to {to:?}")]
    InvalidReservationTransition { from: ReservationStatus, to: ReservationStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
