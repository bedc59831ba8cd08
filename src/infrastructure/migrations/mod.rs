//! Database migrations infrastructure

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Trait for running database migrations
#[async_trait]
pub trait Migrator: Send + Sync {
    /// Runs all pending migrations, returning how many were applied
    async fn run(&self) -> Result<usize, DomainError>;

    /// Reverts the latest applied migration, returning its version
    async fn revert(&self) -> Result<Option<i64>, DomainError>;

    /// Returns the current migration version
    async fn version(&self) -> Result<Option<i64>, DomainError>;
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    /// SQL to run when applying the migration
    pub up: &'static str,
    /// SQL to run when reverting the migration
    pub down: &'static str,
}

/// Embedded migrations in ascending version order
pub fn user_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create users table",
            up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);
            "#,
            down: r#"
            DROP TABLE IF EXISTS users;
            "#,
        },
    ]
}

/// PostgreSQL migrator over the embedded migration set
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
    migrations: Vec<Migration>,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            migrations: user_migrations(),
        }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get applied migrations: {}", e)))
    }

    /// Applies one migration and records it in a single transaction
    async fn apply(&self, migration: &Migration) -> Result<(), DomainError> {
        let fail = |e: sqlx::Error| {
            DomainError::storage(format!(
                "Failed to run migration {}: {}",
                migration.version, e
            ))
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;

        sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(migration.up))
            .await
            .map_err(fail)?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        tx.commit().await.map_err(fail)?;

        info!(
            version = migration.version,
            description = migration.description,
            "Migration applied"
        );

        Ok(())
    }

    async fn unapply(&self, migration: &Migration) -> Result<(), DomainError> {
        let fail = |e: sqlx::Error| {
            DomainError::storage(format!(
                "Failed to revert migration {}: {}",
                migration.version, e
            ))
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;

        sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(migration.down))
            .await
            .map_err(fail)?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        tx.commit().await.map_err(fail)?;

        info!(version = migration.version, "Migration reverted");

        Ok(())
    }
}

#[async_trait]
impl Migrator for PostgresMigrator {
    async fn run(&self) -> Result<usize, DomainError> {
        self.ensure_migrations_table().await?;
        let applied = self.applied_versions().await?;

        let pending = pending_migrations(&self.migrations, &applied);
        for migration in &pending {
            self.apply(migration).await?;
        }

        Ok(pending.len())
    }

    async fn revert(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;
        let applied = self.applied_versions().await?;

        let Some(latest) = applied.last().copied() else {
            return Ok(None);
        };

        let migration = self
            .migrations
            .iter()
            .find(|m| m.version == latest)
            .ok_or_else(|| {
                DomainError::storage(format!("Applied migration {} is unknown", latest))
            })?;

        self.unapply(migration).await?;

        Ok(Some(latest))
    }

    async fn version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

fn pending_migrations<'a>(migrations: &'a [Migration], applied: &[i64]) -> Vec<&'a Migration> {
    migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect()
}

/// Runs all pending migrations against the pool
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    PostgresMigrator::new(pool.clone()).run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_order() {
        let migrations = user_migrations();

        assert!(!migrations.is_empty());
        for pair in migrations.windows(2) {
            assert!(
                pair[1].version > pair[0].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_migrations_content() {
        for migration in user_migrations() {
            assert!(!migration.description.is_empty());
            assert!(!migration.up.trim().is_empty());
            assert!(!migration.down.trim().is_empty());
        }
    }

    #[test]
    fn test_users_table_enforces_unique_email() {
        let migrations = user_migrations();
        let create = &migrations[0];

        assert!(create.up.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(create.up.contains("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email"));
    }

    #[test]
    fn test_no_unused_indexes() {
        assert!(user_migrations()
            .iter()
            .all(|m| !m.up.contains("idx_users_created_at")));
    }

    #[test]
    fn test_pending_migrations() {
        let migrations = user_migrations();

        let all = pending_migrations(&migrations, &[]);
        assert_eq!(all.len(), migrations.len());

        let applied: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        assert!(pending_migrations(&migrations, &applied).is_empty());

        let rest = pending_migrations(&migrations, &[1]);
        assert!(rest.iter().all(|m| m.version != 1));
    }
}
