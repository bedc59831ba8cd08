//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::domain::pagination::PageRequest;
use crate::domain::user::{NewUser, User, UserChanges, UserFilter, UserId, UserRepository};
use crate::domain::DomainError;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user by email: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, &user.email, "create"))?;

        row_to_user(&row)
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, DomainError> {
        let email = changes.email.as_deref().unwrap_or_default();

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id.value())
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, email, "update"))?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::not_found(format!("User '{}' not found", id))),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Vec<User>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(to_i64(page.limit()))
            .push(" OFFSET ")
            .push_bind(to_i64(page.offset()));

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut query, filter);

        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count users: {}", e)))?;

        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("User store unreachable: {}", e)))?;

        Ok(())
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let mut separator = " WHERE ";

    if let Some(name) = &filter.name {
        query
            .push(separator)
            .push("name ILIKE ")
            .push_bind(like_pattern(name));
        separator = " AND ";
    }

    if let Some(email) = &filter.email {
        query
            .push(separator)
            .push("email ILIKE ")
            .push_bind(like_pattern(email));
    }
}

/// Build a `%needle%` pattern with LIKE metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn write_error(e: sqlx::Error, email: &str, action: &str) -> DomainError {
    let unique_violation = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if unique_violation {
        DomainError::conflict(format!("Email '{}' is already registered", email))
    } else {
        DomainError::storage(format!("Failed to {} user: {}", action, e))
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Invalid user row: {}", e));

    Ok(User::from_parts(
        UserId::new(row.try_get("id").map_err(read)?),
        row.try_get::<String, _>("name").map_err(read)?,
        row.try_get::<String, _>("email").map_err(read)?,
        row.try_get::<String, _>("password_hash").map_err(read)?,
        row.try_get("created_at").map_err(read)?,
        row.try_get("updated_at").map_err(read)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_needle() {
        assert_eq!(like_pattern("ada"), "%ada%");
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_filter_sql_without_filters() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut query, &UserFilter::default());
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM users");
    }

    #[test]
    fn test_filter_sql_with_both_filters() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        let filter = UserFilter::new(Some("ada".into()), Some("example".into()));
        push_filter(&mut query, &filter);
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM users WHERE name ILIKE $1 AND email ILIKE $2"
        );
    }

    #[test]
    fn test_filter_sql_with_email_only() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut query, &UserFilter::new(None, Some("corp".into())));
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM users WHERE email ILIKE $1");
    }

    #[test]
    fn test_to_i64_saturates() {
        assert_eq!(to_i64(10), 10);
        assert_eq!(to_i64(u64::MAX), i64::MAX);
    }

    /// Connects to `DATABASE_URL` and applies migrations; `None` when unset
    async fn connect() -> Option<PostgresUserRepository> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.unwrap();
        crate::infrastructure::migrations::run_migrations(&pool)
            .await
            .unwrap();

        Some(PostgresUserRepository::new(pool))
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    // cargo test -- --ignored, with DATABASE_URL pointing at a scratch database
    #[tokio::test]
    #[ignore]
    async fn test_postgres_store_semantics() {
        let Some(repo) = connect().await else {
            return;
        };
        let tag = uuid::Uuid::new_v4().simple().to_string();

        let first = repo
            .create(new_user(&format!("a%b {}", tag), &format!("{}-1@example.com", tag)))
            .await
            .unwrap();
        let second = repo
            .create(new_user(&format!("axb {}", tag), &format!("{}-2@example.com", tag)))
            .await
            .unwrap();
        assert!(second.id() > first.id());

        let err = repo
            .create(new_user("dup", &format!("{}-1@example.com", tag)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));

        let taken = UserChanges {
            email: Some(format!("{}-1@example.com", tag)),
            ..Default::default()
        };
        let err = repo.update(second.id(), &taken).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));

        let rename = UserChanges {
            name: Some("ghost".to_string()),
            ..Default::default()
        };
        let err = repo.update(UserId::new(i64::MAX), &rename).await.unwrap_err();
        assert!(err.is_not_found());

        // `%` is literal, so "axb" must not match "a%b"
        let escaped = UserFilter::new(Some("a%b".to_string()), Some(tag.clone()));
        assert_eq!(repo.count(&escaped).await.unwrap(), 1);
        let both = UserFilter::new(None, Some(tag.to_uppercase()));
        let listed = repo.list(&both, PageRequest::new(1, 10, 100)).await.unwrap();
        assert_eq!(
            listed.iter().map(|u| u.id()).collect::<Vec<_>>(),
            vec![first.id(), second.id()]
        );

        repo.ping().await.unwrap();

        assert!(repo.delete(first.id()).await.unwrap());
        assert!(repo.delete(second.id()).await.unwrap());
        assert!(!repo.delete(first.id()).await.unwrap());
    }
}
