use std::fmt;

use serde::Deserialize;

use crate::domain::DomainError;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    pub max_connections: u32,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Symmetric secret used to sign bearer tokens
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            run_migrations: true,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &redact(&self.url))
            .field("max_connections", &self.max_connections)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &redact(&self.jwt_secret))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "[unset]"
    } else {
        "[redacted]"
    }
}

impl AppConfig {
    /// Load configuration from files, `APP__*` variables and the well-known
    /// `DATABASE_URL` (or `DSN`) and `JWT_SECRET` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("DSN"))
            .ok();
        let jwt_secret = std::env::var("JWT_SECRET").ok();

        Self::load_with_overrides(database_url, jwt_secret)
    }

    fn load_with_overrides(
        database_url: Option<String>,
        jwt_secret: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", database_url)?
            .set_override_option("auth.jwt_secret", jwt_secret)?
            .build()?;

        config.try_deserialize()
    }

    /// Check the settings the service cannot start without
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.database.url.trim().is_empty() {
            return Err(DomainError::configuration(
                "database connection string is required (DATABASE_URL)",
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(DomainError::configuration(
                "token signing secret is required (JWT_SECRET)",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(DomainError::configuration(
                "database.max_connections must be at least 1",
            ));
        }

        let pagination = &self.pagination;
        if pagination.max_page_size == 0 {
            return Err(DomainError::configuration(
                "pagination.max_page_size must be at least 1",
            ));
        }
        if pagination.default_page_size == 0
            || pagination.default_page_size > pagination.max_page_size
        {
            return Err(DomainError::configuration(format!(
                "pagination.default_page_size must be between 1 and {}",
                pagination.max_page_size
            )));
        }

        if !self.metrics.path.starts_with('/') {
            return Err(DomainError::configuration(
                "metrics.path must start with '/'",
            ));
        }

        Ok(())
    }
}
