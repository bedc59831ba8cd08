//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{NewUser, User, UserChanges, UserFilter, UserId};
use crate::domain::pagination::PageRequest;
use crate::domain::DomainError;

/// Repository trait for user storage
///
/// Implementations must report a duplicate email as `DomainError::Conflict`
/// from `create` and `update`, and must not write anything when `update`
/// targets a missing user.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their (normalized) email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Insert a new user, assigning its identifier
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;

    /// Merge `changes` into an existing user
    ///
    /// Returns `DomainError::NotFound` when no user has this ID.
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, DomainError>;

    /// Delete a user, returning whether a record was removed
    async fn delete(&self, id: UserId) -> Result<bool, DomainError>;

    /// List one page of users matching the filter, ordered by ID
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Vec<User>, DomainError>;

    /// Count users matching the filter
    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError>;

    /// Cheap round trip to the store
    async fn ping(&self) -> Result<(), DomainError>;
}
