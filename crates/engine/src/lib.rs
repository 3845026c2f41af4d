//! Reservation Engine - the business-logic layer over the inventory store.
//!
//! Every mutation of restaurants, tables, users, and reservations goes
//! through this crate; the agent pipeline above it only reads the typed
//! outcomes. The engine owns the availability invariants:
//!
//! - at most one confirmed reservation per (table, slot) pair,
//! - party size never exceeds the claimed table's capacity,
//! - cancel frees exactly the slot the reservation held,
//! - an update is always cancel-then-reserve under a fresh id.
//!
//! The slot claim itself is delegated to
//! `RestaurantRepository::try_reserve_slot`, which is the single
//! serialization point for booking contention.

pub mod engine;

pub use engine::{
    CancelOutcome, ConfirmedReservation, EngineError, MenuView, PrebookedMeal,
    RedirectSuggestion, ReservationEngine, ReserveOutcome, ReserveRequest,
    RestaurantRecommendation, UpdateRequest,
};
