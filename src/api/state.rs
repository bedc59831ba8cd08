//! Application state for shared services

use std::sync::Arc;

use crate::config::PaginationConfig;
use crate::domain::user::{Credentials, NewUserInput, UserPatch};
use crate::domain::{DomainError, Page, PageRequest, User, UserFilter, UserId};
use crate::infrastructure::auth::AuthToken;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
    pub auth_service: Arc<dyn AuthServiceTrait>,
    pub pagination: PaginationConfig,
}

/// Trait for user management operations
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn list(&self, filter: &UserFilter, page: PageRequest)
        -> Result<Page<User>, DomainError>;
    async fn ping(&self) -> Result<(), DomainError>;
    async fn create(&self, input: NewUserInput) -> Result<User, DomainError>;
    async fn get(&self, id: UserId) -> Result<User, DomainError>;
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, DomainError>;
    async fn delete(&self, id: UserId) -> Result<(), DomainError>;
}

/// Trait for signup, login and bearer token resolution
#[async_trait::async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn register(&self, input: NewUserInput) -> Result<AuthToken, DomainError>;
    async fn login(&self, credentials: Credentials) -> Result<AuthToken, DomainError>;
    async fn current_user(&self, token: &str) -> Result<User, DomainError>;
}

impl AppState {
    /// Create new application state with provided services
    pub fn new(
        user_service: Arc<dyn UserServiceTrait>,
        auth_service: Arc<dyn AuthServiceTrait>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            user_service,
            auth_service,
            pagination,
        }
    }
}
