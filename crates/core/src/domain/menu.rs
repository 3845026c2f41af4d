use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::restaurant::RestaurantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuItemId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub prebook_allowed: bool,
}

impl MenuItem {
    /// Case-insensitive substring match, the contract every fuzzy menu
    /// lookup in the system follows.
    pub fn name_matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}
