//! Authentication infrastructure module
//!
//! This module provides JWT token management and the credential service
//! behind signup and login.

mod jwt;
mod service;

pub use jwt::{IssuedToken, JwtClaims, JwtConfig, JwtGenerator, JwtService, TOKEN_EXPIRATION_HOURS};
pub use service::{AuthToken, CredentialService};
