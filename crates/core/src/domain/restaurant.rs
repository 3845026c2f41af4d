use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantId(pub String);

/// Unique within its restaurant, not globally.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Booked => "booked",
        }
    }
}

impl std::str::FromStr for SlotStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "available" => Ok(Self::Available),
            "booked" => Ok(Self::Booked),
            other => Err(format!("unknown slot status `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot: DateTime<Utc>,
    pub status: SlotStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub capacity: u32,
    pub price: Decimal,
    pub availability: Vec<SlotAvailability>,
}

impl Table {
    pub fn seats(&self, party_size: u32) -> bool {
        self.capacity >= party_size
    }

    pub fn is_open_at(&self, slot: DateTime<Utc>) -> bool {
        self.availability
            .iter()
            .any(|entry| entry.slot == slot && entry.status == SlotStatus::Available)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub tables: Vec<Table>,
}

impl Restaurant {
    /// Derived from table capacities; the seeder also persists a cached
    /// column, but the tables are authoritative.
    pub fn seating_capacity(&self) -> u32 {
        self.tables.iter().map(|table| table.capacity).sum()
    }

    pub fn can_seat(&self, party_size: u32) -> bool {
        self.tables.iter().any(|table| table.seats(party_size))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{Restaurant, RestaurantId, SlotAvailability, SlotStatus, Table, TableId};

    fn table(id: &str, capacity: u32, status: SlotStatus) -> Table {
        Table {
            id: TableId(id.to_string()),
            capacity,
            price: Decimal::new(800, 2),
            availability: vec![SlotAvailability {
                slot: Utc.with_ymd_and_hms(2025, 5, 20, 19, 0, 0).unwrap(),
                status,
            }],
        }
    }

    #[test]
    fn seating_capacity_sums_table_capacities() {
        let restaurant = Restaurant {
            id: RestaurantId("R1".to_string()),
            name: "Harborview Bistro".to_string(),
            cuisine: "french".to_string(),
            location: "Riverside".to_string(),
            tables: vec![
                table("T1", 2, SlotStatus::Available),
                table("T2", 4, SlotStatus::Booked),
                table("T3", 6, SlotStatus::Available),
            ],
        };

        assert_eq!(restaurant.seating_capacity(), 12);
        assert!(restaurant.can_seat(6));
        assert!(!restaurant.can_seat(7));
    }

    #[test]
    fn table_openness_checks_both_slot_and_status() {
        let slot = Utc.with_ymd_and_hms(2025, 5, 20, 19, 0, 0).unwrap();
        let other_slot = Utc.with_ymd_and_hms(2025, 5, 21, 19, 0, 0).unwrap();

        let open = table("T1", 4, SlotStatus::Available);
        let booked = table("T2", 4, SlotStatus::Booked);

        assert!(open.is_open_at(slot));
        assert!(!open.is_open_at(other_slot));
        assert!(!booked.is_open_at(slot));
    }

    #[test]
    fn slot_status_round_trips_through_storage_form() {
        assert_eq!("available".parse::<SlotStatus>(), Ok(SlotStatus::Available));
        assert_eq!("booked".parse::<SlotStatus>(), Ok(SlotStatus::Booked));
        assert_eq!(SlotStatus::Booked.as_str(), "booked");
        assert!("cancelled".parse::<SlotStatus>().is_err());
    }
}
