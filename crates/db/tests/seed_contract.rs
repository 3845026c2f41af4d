use maitred_db::{connect_with_settings, migrations, SeedDataset};

#[tokio::test]
async fn seed_dataset_loads_and_verifies_on_a_fresh_database() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");

    let result = SeedDataset::load(&pool).await.expect("load seed dataset");
    assert_eq!(result.restaurants_seeded.len(), 6);

    let verification = SeedDataset::verify(&pool).await.expect("verify seed dataset");
    assert!(
        verification.all_present,
        "all seed checks should pass, failed: {:?}",
        verification
            .checks
            .iter()
            .filter(|(_, passed)| !passed)
            .map(|(check, _)| *check)
            .collect::<Vec<_>>(),
    );
}

#[tokio::test]
async fn verification_fails_before_seeding() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");

    let verification = SeedDataset::verify(&pool).await.expect("verify empty database");
    assert!(!verification.all_present);

    let failed: Vec<&str> = verification
        .checks
        .iter()
        .filter(|(_, passed)| !passed)
        .map(|(check, _)| *check)
        .collect();
    assert!(failed.contains(&"restaurants-present"));
}
