use serde::{Deserialize, Serialize};

use super::models::UserModel;

/// Hard cap on page size regardless of what the client asks for
pub const MAX_PER_PAGE: usize = 100;

/// Request body for POST /register
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Request body for POST /login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user, never carrying the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            address: user.address,
        }
    }
}

/// Raw query string for GET /users; values are parsed leniently
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Resolved pagination parameters, always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Missing, unparsable, zero or negative values fall back to the defaults
    pub fn from_query(query: &PageQuery, default_per_page: usize) -> Self {
        let page = positive(query.page.as_deref()).unwrap_or(1);
        let per_page = positive(query.per_page.as_deref())
            .unwrap_or(default_per_page)
            .min(MAX_PER_PAGE);

        Self { page, per_page }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

fn positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
}

/// One page of users plus the total count
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
    pub total: usize,
}
