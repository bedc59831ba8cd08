//! User service for user management and credential checks

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::api::state::UserServiceTrait;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::user::{
    validate_input, NewUser, NewUserInput, User, UserChanges, UserFilter, UserId, UserPatch,
    UserRepository,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

const DUMMY_PASSWORD: &str = "not-a-real-password";

/// User service for management and authentication
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    /// Verified against when the email is unknown, so that both login
    /// failures pay for one hash verification
    dummy_hash: String,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to prepare dummy password hash");
            String::new()
        });

        Self {
            repository,
            hasher,
            dummy_hash,
        }
    }

    /// List one page of users matching the filter
    pub async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        let total_items = self.repository.count(filter).await?;
        let items = self.repository.list(filter, page).await?;

        Ok(Page::new(items, page, total_items))
    }

    /// Check that the user store answers
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.repository.ping().await
    }

    /// Create a new user
    ///
    /// A duplicate email is detected by the repository's uniqueness
    /// constraint, which is reported as `DomainError::Conflict`.
    pub async fn create(&self, input: NewUserInput) -> Result<User, DomainError> {
        let input = input.normalized();
        validate_input(&input)?;

        let password_hash = self.hasher.hash(&input.password)?;

        let user = self
            .repository
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id(), "User created");

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: UserId) -> Result<User, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    /// Apply a partial update to a user
    pub async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, DomainError> {
        let patch = patch.normalized();
        validate_input(&patch)?;

        let password_hash = match &patch.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        let changes = UserChanges {
            name: patch.name,
            email: patch.email,
            password_hash,
        };

        if changes.is_empty() {
            return self.get(id).await;
        }

        let user = self.repository.update(id, &changes).await?;

        debug!(user_id = %id, "User updated");

        Ok(user)
    }

    /// Delete a user
    pub async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        if !self.repository.delete(id).await? {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        info!(user_id = %id, "User deleted");

        Ok(())
    }

    /// Authenticate a user with email and password
    ///
    /// Returns `None` both for an unknown email and for a wrong password.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let Some(user) = self.repository.get_by_email(email).await? else {
            self.hasher.verify(password, &self.dummy_hash);
            return Ok(None);
        };

        if !self.hasher.verify(password, user.password_hash()) {
            return Ok(None);
        }

        Ok(Some(user))
    }
}

#[async_trait]
impl<R: UserRepository + 'static, H: PasswordHasher + 'static> UserServiceTrait
    for UserService<R, H>
{
    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        UserService::list(self, filter, page).await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        UserService::ping(self).await
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: NewUserInput) -> Result<User, DomainError> {
        UserService::create(self, input).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: UserId) -> Result<User, DomainError> {
        UserService::get(self, id).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, DomainError> {
        UserService::update(self, id, patch).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        UserService::delete(self, id).await
    }
}
