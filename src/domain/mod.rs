//! Domain layer - Core entities, rules and repository traits

pub mod error;
pub mod pagination;
pub mod user;

pub use error::DomainError;
pub use pagination::{Page, PageInfo, PageRequest};
pub use user::{User, UserFilter, UserId, UserRepository};
