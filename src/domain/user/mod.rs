//! User domain
//!
//! This module provides domain types and traits for user management,
//! including the user entity, input validation rules, and the repository trait.

mod entity;
mod repository;
mod validation;

pub use entity::{NewUser, User, UserChanges, UserFilter, UserId};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_input, Credentials, NewUserInput, UserPatch,
};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
