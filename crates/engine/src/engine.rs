use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use maitred_core::domain::menu::MenuItem;
use maitred_core::domain::reservation::{Reservation, ReservationId, ReservationStatus};
use maitred_core::domain::restaurant::{RestaurantId, TableId};
use maitred_core::domain::user::{ReservationSummary, User, UserId};
use maitred_db::repositories::{
    MenuRepository, RepositoryError, ReservationRepository, RestaurantRepository, UserRepository,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("no table for a party of {party_size} at `{restaurant_id}` for {slot}")]
    SlotUnavailable { restaurant_id: String, slot: DateTime<Utc>, party_size: u32 },
    #[error("{0}")]
    NotAllowed(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl EngineError {
    fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Non-technical text suitable as synthesis input; the raw error never
    /// reaches the user verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => match *entity {
                "restaurant" => "Restaurant not found.".to_string(),
                "reservation" => "Reservation not found.".to_string(),
                "reservation summary" => {
                    "Reservation details were not found in the guest profile.".to_string()
                }
                "menu item" => "That dish is not on the menu.".to_string(),
                "menu" => "No menu is available for that restaurant yet.".to_string(),
                "user" => "Guest profile not found.".to_string(),
                _ => "The requested record was not found.".to_string(),
            },
            Self::SlotUnavailable { .. } => {
                "No tables available. Try another time or location.".to_string()
            }
            Self::NotAllowed(message) => message.clone(),
            Self::Storage(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReserveRequest {
    pub restaurant_id: RestaurantId,
    pub slot: DateTime<Utc>,
    pub party_size: u32,
    pub name: String,
    pub phone: String,
    pub user_id: UserId,
}

#[derive(Clone, Debug)]
pub struct UpdateRequest {
    pub reservation_id: ReservationId,
    pub user_id: UserId,
    pub slot: Option<DateTime<Utc>>,
    pub party_size: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfirmedReservation {
    pub reservation_id: ReservationId,
    pub restaurant_name: String,
    pub table_id: TableId,
    pub table_price: Decimal,
    pub party_size: u32,
    pub slot: DateTime<Utc>,
}

/// Non-error alternative returned when the requested restaurant is full but
/// another location could seat the party.
#[derive(Clone, Debug, PartialEq)]
pub struct RedirectSuggestion {
    pub from_location: String,
    pub restaurant_id: RestaurantId,
    pub restaurant_name: String,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReserveOutcome {
    Confirmed(ConfirmedReservation),
    Redirect(RedirectSuggestion),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Canceled,
    /// Second cancel of the same reservation; accepted as a no-op.
    AlreadyCanceled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrebookedMeal {
    pub reservation_id: ReservationId,
    pub meal_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuView {
    pub restaurant_name: String,
    pub items: Vec<MenuItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RestaurantRecommendation {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub cuisine: String,
    pub location: String,
}

const MAX_RECOMMENDATIONS: usize = 3;

pub struct ReservationEngine {
    restaurants: Arc<dyn RestaurantRepository>,
    menu: Arc<dyn MenuRepository>,
    users: Arc<dyn UserRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl ReservationEngine {
    pub fn new(
        restaurants: Arc<dyn RestaurantRepository>,
        menu: Arc<dyn MenuRepository>,
        users: Arc<dyn UserRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self { restaurants, menu, users, reservations }
    }

    /// The slot flip, the user-profile append, and the reservation insert
    /// are three writes with no cross-write transaction; a crash between
    /// them can leave a booked slot without a reservation record. Inherited
    /// from the source design and left as-is.
    pub async fn reserve(&self, request: ReserveRequest) -> Result<ReserveOutcome, EngineError> {
        let restaurant = self
            .restaurants
            .find_by_id(&request.restaurant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("restaurant", &request.restaurant_id.0))?;

        let Some(table) = self
            .restaurants
            .try_reserve_slot(&request.restaurant_id, request.slot, request.party_size)
            .await?
        else {
            if let Some(alternative) =
                self.redirect_candidate(&restaurant.location, request.party_size).await?
            {
                info!(
                    event_name = "engine.reserve.redirect",
                    restaurant_id = %request.restaurant_id.0,
                    alternative_id = %alternative.restaurant_id.0,
                    "requested restaurant full, suggesting another location"
                );
                return Ok(ReserveOutcome::Redirect(alternative));
            }

            return Err(EngineError::SlotUnavailable {
                restaurant_id: request.restaurant_id.0.clone(),
                slot: request.slot,
                party_size: request.party_size,
            });
        };

        if self.users.find_by_id(&request.user_id).await?.is_none() {
            self.users
                .upsert(User::with_derived_email(request.user_id.clone(), request.phone.clone()))
                .await?;
        }

        let reservation_id = ReservationId::generate();
        self.reservations
            .insert(Reservation::confirmed(reservation_id.clone(), request.user_id.clone()))
            .await?;

        let summary = ReservationSummary {
            reservation_id: reservation_id.clone(),
            restaurant_id: restaurant.id.clone(),
            restaurant_name: restaurant.name.clone(),
            table_id: table.id.clone(),
            table_price: table.price,
            party_size: request.party_size,
            slot: request.slot,
            prebooked_meals: Vec::new(),
        };
        self.users.append_reservation(&request.user_id, summary).await?;

        info!(
            event_name = "engine.reserve.confirmed",
            reservation_id = %reservation_id.0,
            restaurant_id = %restaurant.id.0,
            table_id = %table.id.0,
            party_size = request.party_size,
            guest = %request.name,
            "reservation confirmed"
        );

        Ok(ReserveOutcome::Confirmed(ConfirmedReservation {
            reservation_id,
            restaurant_name: restaurant.name,
            table_id: table.id,
            table_price: table.price,
            party_size: request.party_size,
            slot: request.slot,
        }))
    }

    async fn redirect_candidate(
        &self,
        from_location: &str,
        party_size: u32,
    ) -> Result<Option<RedirectSuggestion>, EngineError> {
        let candidates = self.restaurants.find_matching(None, None, Some(party_size)).await?;

        Ok(candidates
            .into_iter()
            .find(|candidate| !candidate.location.eq_ignore_ascii_case(from_location))
            .map(|candidate| RedirectSuggestion {
                from_location: from_location.to_string(),
                restaurant_id: candidate.id,
                restaurant_name: candidate.name,
                location: candidate.location,
            }))
    }

    pub async fn cancel(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<CancelOutcome, EngineError> {
        let reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| EngineError::not_found("reservation", &reservation_id.0))?;

        if reservation.status == ReservationStatus::Canceled {
            return Ok(CancelOutcome::AlreadyCanceled);
        }

        // A confirmed reservation without its profile summary means the
        // denormalized views diverged; report it instead of guessing which
        // slot to free.
        let summary = self
            .users
            .find_reservation_summary(&reservation.user_id, reservation_id)
            .await?
            .ok_or_else(|| {
                warn!(
                    event_name = "engine.cancel.integrity_fault",
                    reservation_id = %reservation_id.0,
                    user_id = %reservation.user_id.0,
                    "reservation record has no matching profile summary"
                );
                EngineError::not_found("reservation summary", &reservation_id.0)
            })?;

        self.reservations.set_status(reservation_id, ReservationStatus::Canceled).await?;
        self.restaurants
            .release_slot(&summary.restaurant_id, &summary.table_id, summary.slot)
            .await?;

        info!(
            event_name = "engine.cancel.done",
            reservation_id = %reservation_id.0,
            restaurant_id = %summary.restaurant_id.0,
            table_id = %summary.table_id.0,
            "reservation canceled and slot released"
        );

        Ok(CancelOutcome::Canceled)
    }

    /// Cancel-then-reserve under a fresh id. The old slot is released
    /// before the new claim is attempted, so a failing re-reserve leaves
    /// the guest without a confirmed reservation; the caller sees exactly
    /// what the reserve step yielded.
    pub async fn update(&self, request: UpdateRequest) -> Result<ReserveOutcome, EngineError> {
        let summary = self
            .users
            .find_reservation_summary(&request.user_id, &request.reservation_id)
            .await?
            .ok_or_else(|| EngineError::not_found("reservation", &request.reservation_id.0))?;

        let user = self
            .users
            .find_by_id(&request.user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("user", &request.user_id.0))?;

        self.cancel(&request.reservation_id).await?;

        self.reserve(ReserveRequest {
            restaurant_id: summary.restaurant_id.clone(),
            slot: request.slot.unwrap_or(summary.slot),
            party_size: request.party_size.unwrap_or(summary.party_size),
            name: user.id.0.clone(),
            phone: user.phone.clone(),
            user_id: request.user_id,
        })
        .await
    }

    pub async fn prebook_meal(
        &self,
        reservation_id: &ReservationId,
        meal_name: &str,
        user_id: &UserId,
    ) -> Result<PrebookedMeal, EngineError> {
        let summary = self
            .users
            .find_reservation_summary(user_id, reservation_id)
            .await?
            .ok_or_else(|| EngineError::not_found("reservation", &reservation_id.0))?;

        let item = self
            .menu
            .find_item_fuzzy(&summary.restaurant_id, meal_name)
            .await?
            .ok_or_else(|| EngineError::not_found("menu item", meal_name))?;

        if !item.prebook_allowed {
            return Err(EngineError::NotAllowed(format!(
                "{} cannot be pre-booked.",
                item.name
            )));
        }

        self.users.append_prebooked_meal(user_id, reservation_id, &item.name).await?;

        info!(
            event_name = "engine.prebook.done",
            reservation_id = %reservation_id.0,
            meal = %item.name,
            "meal added to reservation"
        );

        Ok(PrebookedMeal { reservation_id: reservation_id.clone(), meal_name: item.name })
    }

    pub async fn menu(&self, restaurant_id: &RestaurantId) -> Result<MenuView, EngineError> {
        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("restaurant", &restaurant_id.0))?;

        let items = self.menu.list_for_restaurant(restaurant_id).await?;
        if items.is_empty() {
            return Err(EngineError::not_found("menu", &restaurant_id.0));
        }

        Ok(MenuView { restaurant_name: restaurant.name, items })
    }

    /// Empty result is a signal for the caller to relax the filters, not a
    /// fault.
    pub async fn recommend(
        &self,
        cuisine: Option<&str>,
        location: Option<&str>,
        party_size: Option<u32>,
    ) -> Result<Vec<RestaurantRecommendation>, EngineError> {
        let mut matches = self.restaurants.find_matching(cuisine, location, party_size).await?;
        matches.truncate(MAX_RECOMMENDATIONS);

        Ok(matches
            .into_iter()
            .map(|restaurant| RestaurantRecommendation {
                restaurant_id: restaurant.id,
                name: restaurant.name,
                cuisine: restaurant.cuisine,
                location: restaurant.location,
            })
            .collect())
    }
}
