//! User Service
//!
//! A user-management HTTP API with:
//! - Signup and login issuing signed bearer tokens
//! - User CRUD with substring filters and offset pagination
//! - PostgreSQL persistence with embedded migrations

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::UserRepository;
use infrastructure::{
    auth::{CredentialService, JwtConfig, JwtService},
    migrations::run_migrations,
    user::{Argon2Hasher, PostgresUserRepository, UserService},
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Connect to PostgreSQL with the configured pool size
pub async fn connect_database(config: &AppConfig) -> anyhow::Result<PgPool> {
    info!(
        max_connections = config.database.max_connections,
        "Connecting to PostgreSQL..."
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;

    info!("PostgreSQL connection established");

    Ok(pool)
}

/// Create the application state backed by PostgreSQL
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let pool = connect_database(config).await?;

    if config.database.run_migrations {
        let applied = run_migrations(&pool).await?;
        info!(applied, "Database migrations complete");
    }

    let repository = Arc::new(PostgresUserRepository::new(pool));

    Ok(build_app_state(repository, config))
}

/// Wire services around a user repository
pub fn build_app_state<R: UserRepository + 'static>(
    repository: Arc<R>,
    config: &AppConfig,
) -> AppState {
    let users = Arc::new(UserService::new(repository, Arc::new(Argon2Hasher::new())));
    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
    )));
    let credentials = Arc::new(CredentialService::new(users.clone(), jwt));

    AppState::new(users, credentials, config.pagination.clone())
}
