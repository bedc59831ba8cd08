//! In-memory user repository implementation

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::pagination::PageRequest;
use crate::domain::user::{NewUser, User, UserChanges, UserFilter, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    /// Index for email -> user ID lookup
    email_index: HashMap<String, UserId>,
    last_id: i64,
}

/// In-memory implementation of UserRepository
///
/// All state lives behind one lock so that the email uniqueness check and
/// the write that depends on it happen atomically.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .email_index
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut inner = self.inner.write().await;

        if inner.email_index.contains_key(&user.email) {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        inner.last_id += 1;
        let id = UserId::new(inner.last_id);
        let now = Utc::now();
        let created = User::from_parts(id, user.name, user.email, user.password_hash, now, now);

        inner.email_index.insert(created.email().to_string(), id);
        inner.users.insert(id, created.clone());

        Ok(created)
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, DomainError> {
        let mut inner = self.inner.write().await;

        let Some(existing) = inner.users.get(&id) else {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        };
        let old_email = existing.email().to_string();

        if let Some(new_email) = changes.email.as_ref().filter(|e| **e != old_email) {
            if inner.email_index.contains_key(new_email) {
                return Err(DomainError::conflict(format!(
                    "Email '{}' is already registered",
                    new_email
                )));
            }
            inner.email_index.remove(&old_email);
            inner.email_index.insert(new_email.clone(), id);
        }

        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;
        user.apply(changes);

        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;

        if let Some(user) = inner.users.remove(&id) {
            inner.email_index.remove(user.email());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Vec<User>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .users
            .values()
            .filter(|u| filter.matches(u))
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hashed_password".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(new_user("A", "a@example.com")).await.unwrap();
        let second = repo.create(new_user("B", "b@example.com")).await.unwrap();

        assert_eq!(first.id(), UserId::new(1));
        assert_eq!(second.id(), UserId::new(2));
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Ada", "ada@example.com")).await.unwrap();

        let retrieved = repo.get(user.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.name(), "Ada");
        assert_eq!(retrieved.email(), "ada@example.com");
        assert_eq!(retrieved.password_hash(), "hashed_password");
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Ada", "ada@example.com")).await.unwrap();

        let found = repo.get_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found.id(), user.id());

        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("A", "same@example.com")).await.unwrap();

        let err = repo.create(new_user("B", "same@example.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(repo.count(&UserFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_reindexes_email() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Ada", "ada@example.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("lovelace@example.com".to_string()),
            ..Default::default()
        };
        let updated = repo.update(user.id(), &changes).await.unwrap();

        assert_eq!(updated.name(), "Ada");
        assert_eq!(updated.email(), "lovelace@example.com");
        assert!(repo.get_by_email("ada@example.com").await.unwrap().is_none());
        assert!(repo.get_by_email("lovelace@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("A", "a@example.com")).await.unwrap();
        let b = repo.create(new_user("B", "b@example.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        let err = repo.update(b.id(), &changes).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));

        let unchanged = repo.get(b.id()).await.unwrap().unwrap();
        assert_eq!(unchanged.email(), "b@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();

        let err = repo
            .update(UserId::new(99), &UserChanges::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(repo.count(&UserFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Ada", "ada@example.com")).await.unwrap();

        assert!(repo.delete(user.id()).await.unwrap());
        assert!(repo.get(user.id()).await.unwrap().is_none());
        assert!(repo.get_by_email("ada@example.com").await.unwrap().is_none());

        assert!(!repo.delete(user.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let repo = InMemoryUserRepository::new();
        for i in 1..=25 {
            repo.create(new_user(&format!("user{}", i), &format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        let page = repo
            .list(&UserFilter::default(), PageRequest::new(2, 10, 100))
            .await
            .unwrap();

        let ids: Vec<i64> = page.iter().map(|u| u.id().value()).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());

        let last = repo
            .list(&UserFilter::default(), PageRequest::new(3, 10, 100))
            .await
            .unwrap();
        assert_eq!(last.len(), 5);
    }

    #[tokio::test]
    async fn test_list_and_count_with_filters() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("Alice Smith", "alice@corp.io")).await.unwrap();
        repo.create(new_user("Bob Smith", "bob@home.net")).await.unwrap();
        repo.create(new_user("Carol Jones", "carol@corp.io")).await.unwrap();

        let smiths = UserFilter::new(Some("SMITH".into()), None);
        assert_eq!(repo.count(&smiths).await.unwrap(), 2);

        let corp_smiths = UserFilter::new(Some("smith".into()), Some("corp".into()));
        let users = repo.list(&corp_smiths, PageRequest::default()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name(), "Alice Smith");
    }
}
