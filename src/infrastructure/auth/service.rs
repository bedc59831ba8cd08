//! Credential service: registration and login

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::api::state::AuthServiceTrait;
use crate::domain::user::{validate_input, Credentials, NewUserInput, User, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_login, record_signup};
use crate::infrastructure::user::{PasswordHasher, UserService};

use super::jwt::JwtGenerator;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Token handed back to a client after signup or login
#[derive(Debug, Clone, Serialize)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registers users and exchanges credentials for signed tokens
#[derive(Debug)]
pub struct CredentialService<R: UserRepository, H: PasswordHasher> {
    users: Arc<UserService<R, H>>,
    jwt: Arc<dyn JwtGenerator>,
}

impl<R: UserRepository, H: PasswordHasher> CredentialService<R, H> {
    pub fn new(users: Arc<UserService<R, H>>, jwt: Arc<dyn JwtGenerator>) -> Self {
        Self { users, jwt }
    }

    /// Create a user and issue a token bound to the new identifier
    pub async fn register(&self, input: NewUserInput) -> Result<AuthToken, DomainError> {
        let user = self.users.create(input).await?;
        let token = self.issue(&user)?;

        record_signup();
        info!(user_id = %user.id(), "User registered");

        Ok(token)
    }

    /// Verify credentials and issue a token
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, credentials: Credentials) -> Result<AuthToken, DomainError> {
        let credentials = credentials.normalized();
        validate_input(&credentials)?;

        let user = self
            .users
            .authenticate(&credentials.email, &credentials.password)
            .await?;

        let Some(user) = user else {
            record_login(false);
            warn!("Login failed");
            return Err(DomainError::authentication(INVALID_CREDENTIALS));
        };

        let token = self.issue(&user)?;

        record_login(true);
        debug!(user_id = %user.id(), "Login succeeded");

        Ok(token)
    }

    /// Resolve the user a bearer token was issued for
    pub async fn current_user(&self, token: &str) -> Result<User, DomainError> {
        let claims = self.jwt.validate(token)?;

        match self.users.get(claims.user_id()).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => Err(DomainError::authentication("Invalid token")),
            Err(e) => Err(e),
        }
    }

    fn issue(&self, user: &User) -> Result<AuthToken, DomainError> {
        let issued = self.jwt.generate(user.id())?;

        Ok(AuthToken {
            token: issued.token,
            expires_at: issued.claims.expires_at(),
        })
    }
}

#[async_trait]
impl<R: UserRepository + 'static, H: PasswordHasher + 'static> AuthServiceTrait
    for CredentialService<R, H>
{
    #[instrument(skip(self, input))]
    async fn register(&self, input: NewUserInput) -> Result<AuthToken, DomainError> {
        CredentialService::register(self, input).await
    }

    #[instrument(skip(self, credentials))]
    async fn login(&self, credentials: Credentials) -> Result<AuthToken, DomainError> {
        CredentialService::login(self, credentials).await
    }

    #[instrument(skip(self, token))]
    async fn current_user(&self, token: &str) -> Result<User, DomainError> {
        CredentialService::current_user(self, token).await
    }
}
