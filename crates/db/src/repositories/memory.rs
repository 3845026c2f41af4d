use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use maitred_core::domain::menu::MenuItem;
use maitred_core::domain::reservation::{Reservation, ReservationId, ReservationStatus};
use maitred_core::domain::restaurant::{
    Restaurant, RestaurantId, SlotStatus, Table, TableId,
};
use maitred_core::domain::user::{ReservationSummary, User, UserId};

use super::{
    MenuRepository, RepositoryError, ReservationRepository, RestaurantRepository, UserRepository,
};

/// Insertion order stands in for storage order, so the first-found
/// tie-break matches the SQL implementation.
#[derive(Default)]
pub struct InMemoryRestaurantRepository {
    restaurants: RwLock<Vec<Restaurant>>,
}

impl InMemoryRestaurantRepository {
    pub fn with_restaurants(restaurants: Vec<Restaurant>) -> Self {
        Self { restaurants: RwLock::new(restaurants) }
    }
}

#[async_trait]
impl RestaurantRepository for InMemoryRestaurantRepository {
    async fn find_by_id(&self, id: &RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let restaurants = self.restaurants.read().await;
        Ok(restaurants.iter().find(|restaurant| &restaurant.id == id).cloned())
    }

    async fn find_matching(
        &self,
        cuisine: Option<&str>,
        location: Option<&str>,
        min_capacity: Option<u32>,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let cuisine = cuisine.unwrap_or_default().to_lowercase();
        let location = location.unwrap_or_default().to_lowercase();

        let restaurants = self.restaurants.read().await;
        Ok(restaurants
            .iter()
            .filter(|restaurant| {
                restaurant.cuisine.to_lowercase().contains(&cuisine)
                    && restaurant.location.to_lowercase().contains(&location)
                    && min_capacity.map_or(true, |capacity| restaurant.can_seat(capacity))
            })
            .cloned()
            .collect())
    }

    async fn try_reserve_slot(
        &self,
        restaurant_id: &RestaurantId,
        slot: DateTime<Utc>,
        party_size: u32,
    ) -> Result<Option<Table>, RepositoryError> {
        // Single write lock covers the whole find-and-flip, which is the
        // in-memory equivalent of the conditional UPDATE.
        let mut restaurants = self.restaurants.write().await;
        let Some(restaurant) =
            restaurants.iter_mut().find(|restaurant| &restaurant.id == restaurant_id)
        else {
            return Ok(None);
        };

        for table in &mut restaurant.tables {
            if !table.seats(party_size) {
                continue;
            }
            if let Some(entry) = table
                .availability
                .iter_mut()
                .find(|entry| entry.slot == slot && entry.status == SlotStatus::Available)
            {
                entry.status = SlotStatus::Booked;
                return Ok(Some(table.clone()));
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
        let mut restaurants = self.restaurants.write().await;
        if let Some(restaurant) =
            restaurants.iter_mut().find(|restaurant| &restaurant.id == restaurant_id)
        {
            if let Some(table) =
                restaurant.tables.iter_mut().find(|table| &table.id == table_id)
            {
                if let Some(entry) =
                    table.availability.iter_mut().find(|entry| entry.slot == slot)
                {
                    entry.status = SlotStatus::Available;
                }
            }
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMenuRepository {
    items: RwLock<Vec<MenuItem>>,
}

impl InMemoryMenuRepository {
    pub fn with_items(items: Vec<MenuItem>) -> Self {
        Self { items: RwLock::new(items) }
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenuRepository {
    async fn list_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.iter().filter(|item| &item.restaurant_id == restaurant_id).cloned().collect())
    }

    async fn find_item_fuzzy(
        &self,
        restaurant_id: &RestaurantId,
        name: &str,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .find(|item| &item.restaurant_id == restaurant_id && item.name_matches(name))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id.0).cloned())
    }

    async fn upsert(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.entry(user.id.0.clone()).or_insert(user);
        Ok(())
    }

    async fn append_reservation(
        &self,
        user_id: &UserId,
        summary: ReservationSummary,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&user_id.0) {
            user.reservations.push(summary);
        }
        Ok(())
    }

    async fn find_reservation_summary(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
    ) -> Result<Option<ReservationSummary>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id.0)
            .and_then(|user| user.summary_for(reservation_id))
            .cloned())
    }

    async fn append_prebooked_meal(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
        meal_name: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&user_id.0) {
            if let Some(summary) = user
                .reservations
                .iter_mut()
                .find(|summary| &summary.reservation_id == reservation_id)
            {
                summary.prebooked_meals.push(meal_name.to_string());
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryReservationRepository {
    reservations: RwLock<HashMap<String, Reservation>>,
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn find_by_id(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(&id.0).cloned())
    }

    async fn insert(&self, reservation: Reservation) -> Result<(), RepositoryError> {
        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id.0.clone(), reservation);
        Ok(())
    }

    async fn set_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<(), RepositoryError> {
        let mut reservations = self.reservations.write().await;
        if let Some(reservation) = reservations.get_mut(&id.0) {
            reservation.status = status;
        }
        Ok(())
    }
}
