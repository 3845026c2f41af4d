use sqlx::{Executor, Row};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Canonical demo inventory contract backing the seed command and tests.
const SEED_RESTAURANTS: &[RestaurantSeedContract] = &[
    RestaurantSeedContract {
        id: "R1",
        name: "Maison Lumiere",
        cuisine: "french",
        location: "Downtown",
        table_count: 4,
    },
    RestaurantSeedContract {
        id: "R2",
        name: "Trattoria Ponte",
        cuisine: "italian",
        location: "Midtown",
        table_count: 4,
    },
    RestaurantSeedContract {
        id: "R3",
        name: "Lotus and Lime",
        cuisine: "thai",
        location: "Riverside",
        table_count: 2,
    },
    RestaurantSeedContract {
        id: "R4",
        name: "Saffron Court",
        cuisine: "indian",
        location: "Uptown",
        table_count: 4,
    },
    RestaurantSeedContract {
        id: "R5",
        name: "Hearth and Harbor",
        cuisine: "american",
        location: "Suburb",
        table_count: 3,
    },
    RestaurantSeedContract {
        id: "R6",
        name: "Verdant Table",
        cuisine: "vegan",
        location: "Downtown",
        table_count: 2,
    },
];

/// Every seeded table is opened for this slot; tests and the demo flow book
/// against it.
pub const DEMO_SLOT: &str = "2025-05-20T19:00:00Z";

struct RestaurantSeedContract {
    id: &'static str,
    name: &'static str,
    cuisine: &'static str,
    location: &'static str,
    table_count: u32,
}

#[derive(Clone, Debug)]
pub struct RestaurantSeedInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub cuisine: &'static str,
    pub location: &'static str,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub restaurants_seeded: Vec<RestaurantSeedInfo>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

/// Deterministic demo dataset: restaurants over five locations, tables with
/// the canonical open slot, cuisine menus including non-prebookable items.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let restaurants_seeded = SEED_RESTAURANTS
            .iter()
            .map(|contract| RestaurantSeedInfo {
                id: contract.id,
                name: contract.name,
                cuisine: contract.cuisine,
                location: contract.location,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { restaurants_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let restaurant_count =
            sqlx::query("SELECT COUNT(*) AS count FROM restaurants")
                .fetch_one(pool)
                .await?
                .get::<i64, _>("count");
        checks.push(("restaurants-present", restaurant_count == SEED_RESTAURANTS.len() as i64));

        let expected_tables: i64 =
            SEED_RESTAURANTS.iter().map(|contract| i64::from(contract.table_count)).sum();
        let table_count =
            sqlx::query("SELECT COUNT(*) AS count FROM restaurant_tables")
                .fetch_one(pool)
                .await?
                .get::<i64, _>("count");
        checks.push(("tables-present", table_count == expected_tables));

        let open_demo_slots = sqlx::query(
            "SELECT COUNT(*) AS count FROM table_slots \
             WHERE slot = ? AND status = 'available'",
        )
        .bind(DEMO_SLOT)
        .fetch_one(pool)
        .await?
        .get::<i64, _>("count");
        checks.push(("demo-slot-open-everywhere", open_demo_slots == expected_tables));

        let restaurants_without_menu = sqlx::query(
            "SELECT COUNT(*) AS count FROM restaurants r \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM menu_items m WHERE m.restaurant_id = r.id)",
        )
        .fetch_one(pool)
        .await?
        .get::<i64, _>("count");
        checks.push(("menus-seeded", restaurants_without_menu == 0));

        let blocked_items = sqlx::query(
            "SELECT COUNT(*) AS count FROM menu_items WHERE prebook_allowed = 0",
        )
        .fetch_one(pool)
        .await?
        .get::<i64, _>("count");
        checks.push(("non-prebookable-present", blocked_items > 0));

        let reservation_count =
            sqlx::query("SELECT COUNT(*) AS count FROM reservations")
                .fetch_one(pool)
                .await?
                .get::<i64, _>("count");
        checks.push(("no-reservations-yet", reservation_count == 0));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}
