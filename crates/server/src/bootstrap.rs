use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use maitred_agent::llm::HttpLlmClient;
use maitred_agent::runtime::AgentRuntime;
use maitred_core::config::{AppConfig, ConfigError, LoadOptions};
use maitred_db::repositories::{
    SqlMenuRepository, SqlReservationRepository, SqlRestaurantRepository, SqlUserRepository,
};
use maitred_db::{connect_with_settings, migrations, DbPool};
use maitred_engine::ReservationEngine;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let engine = Arc::new(ReservationEngine::new(
        Arc::new(SqlRestaurantRepository::new(db_pool.clone())),
        Arc::new(SqlMenuRepository::new(db_pool.clone())),
        Arc::new(SqlUserRepository::new(db_pool.clone())),
        Arc::new(SqlReservationRepository::new(db_pool.clone())),
    ));
    let llm = Arc::new(HttpLlmClient::from_config(&config.llm));
    let runtime = Arc::new(AgentRuntime::new(llm, engine));

    Ok(Application { config, db_pool, runtime })
}

#[cfg(test)]
mod tests {
    use maitred_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            config_path: Some("/nonexistent/maitred.toml".into()),
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                llm_api_key: Some("gsk-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_an_llm_api_key() {
        let result = bootstrap(LoadOptions {
            config_path: Some("/nonexistent/maitred.toml".into()),
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("config validation should fail").to_string();
        assert!(message.contains("llm.api_key"), "{message}");
    }

    #[tokio::test]
    async fn bootstrap_connects_migrates_and_wires_the_runtime() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN \
             ('restaurants', 'table_slots', 'users', 'reservations')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose the inventory tables");

        app.db_pool.close().await;
    }
}
