use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::info;

use maitred_core::domain::reservation::ReservationId;
use maitred_core::domain::restaurant::RestaurantId;
use maitred_core::domain::user::UserId;
use maitred_engine::{
    CancelOutcome, MenuView, ReservationEngine, ReserveOutcome, ReserveRequest,
    RestaurantRecommendation, UpdateRequest,
};

use crate::selector::{ToolName, ToolSelection};

/// Validates the selector's parameters into typed engine requests, runs
/// them, and renders the typed outcome into the result text the
/// synthesizer consumes. Parse and engine failures both come back as
/// plain sentences; nothing here panics on model-shaped input.
pub struct ToolExecutor {
    engine: Arc<ReservationEngine>,
}

impl ToolExecutor {
    pub fn new(engine: Arc<ReservationEngine>) -> Self {
        Self { engine }
    }

    pub async fn execute(&self, selection: &ToolSelection) -> String {
        info!(
            event_name = "tools.execute",
            tool = selection.tool.as_str(),
            "executing selected tool"
        );

        match self.try_execute(selection).await {
            Ok(result) => result,
            Err(message) => format!("Error: {message}"),
        }
    }

    async fn try_execute(&self, selection: &ToolSelection) -> Result<String, String> {
        let params = &selection.parameters;

        match selection.tool {
            ToolName::ReserveTable => {
                let request = ReserveRequest {
                    restaurant_id: RestaurantId(required_str(params, "restaurant_id")?),
                    slot: required_slot(params, "date_time")?,
                    party_size: required_u32(params, "party_size")?,
                    name: required_str(params, "name")?,
                    phone: required_str(params, "phone")?,
                    user_id: UserId(required_str(params, "user_id")?),
                };

                match self.engine.reserve(request).await {
                    Ok(ReserveOutcome::Confirmed(confirmed)) => Ok(format!(
                        "Table {} reserved at {}! Reservation ID: {}. Table price: ${}",
                        confirmed.table_id.0,
                        confirmed.restaurant_name,
                        confirmed.reservation_id.0,
                        confirmed.table_price,
                    )),
                    Ok(ReserveOutcome::Redirect(suggestion)) => Ok(format!(
                        "No tables available in {}. Try {} at {}?",
                        suggestion.from_location,
                        suggestion.restaurant_name,
                        suggestion.location,
                    )),
                    Err(error) => Ok(error.user_message()),
                }
            }
            ToolName::CancelReservation => {
                let reservation_id = ReservationId(required_str(params, "reservation_id")?);

                match self.engine.cancel(&reservation_id).await {
                    Ok(CancelOutcome::Canceled) => Ok("Reservation canceled.".to_string()),
                    Ok(CancelOutcome::AlreadyCanceled) => {
                        Ok("That reservation was already canceled.".to_string())
                    }
                    Err(error) => Ok(error.user_message()),
                }
            }
            ToolName::UpdateReservation => {
                let request = UpdateRequest {
                    reservation_id: ReservationId(required_str(params, "reservation_id")?),
                    user_id: UserId(required_str(params, "user_id")?),
                    slot: optional_slot(params, "date_time")?,
                    party_size: optional_u32(params, "party_size")?,
                };

                match self.engine.update(request).await {
                    Ok(ReserveOutcome::Confirmed(confirmed)) => Ok(format!(
                        "Reservation moved: table {} at {} for {}. New reservation ID: {}.",
                        confirmed.table_id.0,
                        confirmed.restaurant_name,
                        confirmed.slot.to_rfc3339(),
                        confirmed.reservation_id.0,
                    )),
                    Ok(ReserveOutcome::Redirect(suggestion)) => Ok(format!(
                        "Your original time was freed, but no tables are available in {}. \
                         Try {} at {}?",
                        suggestion.from_location,
                        suggestion.restaurant_name,
                        suggestion.location,
                    )),
                    Err(error) => Ok(error.user_message()),
                }
            }
            ToolName::PrebookMeal => {
                let reservation_id = ReservationId(required_str(params, "reservation_id")?);
                let meal_name = required_str(params, "meal_name")?;
                let user_id = UserId(required_str(params, "user_id")?);

                match self.engine.prebook_meal(&reservation_id, &meal_name, &user_id).await {
                    Ok(prebooked) => {
                        Ok(format!("{} added to your reservation.", prebooked.meal_name))
                    }
                    Err(error) => Ok(error.user_message()),
                }
            }
            ToolName::GetMenu => {
                let restaurant_id = RestaurantId(required_str(params, "restaurant_id")?);

                match self.engine.menu(&restaurant_id).await {
                    Ok(view) => Ok(render_menu(&view)),
                    Err(error) => Ok(error.user_message()),
                }
            }
            ToolName::RecommendRestaurant => {
                let cuisine = optional_str(params, "cuisine");
                let location = optional_str(params, "location");
                let party_size = optional_u32(params, "party_size")?;

                match self
                    .engine
                    .recommend(cuisine.as_deref(), location.as_deref(), party_size)
                    .await
                {
                    Ok(recommendations) if recommendations.is_empty() => Ok(
                        "No restaurants match your preferences. Try another cuisine or location."
                            .to_string(),
                    ),
                    Ok(recommendations) => Ok(render_recommendations(&recommendations)),
                    Err(error) => Ok(error.user_message()),
                }
            }
        }
    }
}

fn render_menu(view: &MenuView) -> String {
    let listing = view
        .items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) - ${}{}",
                item.name,
                item.category,
                item.price,
                if item.prebook_allowed { " (Pre-bookable)" } else { "" },
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("Menu for {}: {}", view.restaurant_name, listing)
}

fn render_recommendations(recommendations: &[RestaurantRecommendation]) -> String {
    let listing = recommendations
        .iter()
        .map(|entry| format!("{} ({}) at {}", entry.name, entry.cuisine, entry.location))
        .collect::<Vec<_>>()
        .join(", ");

    format!("Recommended restaurants: {listing}")
}

fn required_str(params: &Map<String, Value>, key: &str) -> Result<String, String> {
    optional_str(params, key)
        .ok_or_else(|| format!("missing or invalid required parameter `{key}`"))
}

fn optional_str(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.clone()),
        _ => None,
    }
}

/// Party sizes arrive as JSON numbers or numeric strings depending on the
/// model's mood; accept both.
fn required_u32(params: &Map<String, Value>, key: &str) -> Result<u32, String> {
    optional_u32(params, key)?
        .ok_or_else(|| format!("missing or invalid required parameter `{key}`"))
}

fn optional_u32(params: &Map<String, Value>, key: &str) -> Result<Option<u32>, String> {
    let parsed = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => {
            number.as_u64().and_then(|value| u32::try_from(value).ok())
        }
        Some(Value::String(raw)) => raw.trim().parse::<u32>().ok(),
        Some(_) => None,
    };

    match parsed.filter(|value| *value > 0) {
        Some(value) => Ok(Some(value)),
        None => Err(format!("parameter `{key}` must be a positive integer")),
    }
}

fn required_slot(params: &Map<String, Value>, key: &str) -> Result<DateTime<Utc>, String> {
    optional_slot(params, key)?
        .ok_or_else(|| format!("missing or invalid required parameter `{key}`"))
}

fn optional_slot(
    params: &Map<String, Value>,
    key: &str,
) -> Result<Option<DateTime<Utc>>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|_| format!("parameter `{key}` must be an ISO-8601 timestamp")),
        Some(_) => Err(format!("parameter `{key}` must be an ISO-8601 timestamp")),
    }
}
