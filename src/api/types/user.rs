//! Request and response bodies for the user endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::domain::{Page, PageInfo, PageRequest, User, UserFilter};

/// Public view of a user; the password hash is never included
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().value(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Query parameters for `GET /users`
///
/// `page` and `page_size` are kept as raw strings so that unparsable values
/// fall back to the defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ListUsersQuery {
    pub fn page_request(&self, config: &PaginationConfig) -> PageRequest {
        let page = parse_number(self.page.as_deref()).unwrap_or(1);
        let page_size =
            parse_number(self.page_size.as_deref()).unwrap_or(config.default_page_size);

        PageRequest::new(page, page_size, config.max_page_size)
    }

    pub fn filter(&self) -> UserFilter {
        UserFilter::new(self.name.clone(), self.email.clone())
    }
}

fn parse_number(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Response for `GET /users`
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PageInfo,
}

impl From<Page<User>> for ListUsersResponse {
    fn from(page: Page<User>) -> Self {
        let pagination = page.info();

        Self {
            users: page.items.iter().map(UserResponse::from).collect(),
            pagination,
        }
    }
}

/// Response for `DELETE /users/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserResponse {
    pub message: String,
    pub id: i64,
}
