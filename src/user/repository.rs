use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Result of attempting to store a new user
#[derive(Debug, Clone, PartialEq)]
pub enum InsertUserResult {
    /// The user was stored
    Inserted,
    /// Another user already holds this username; nothing was written
    AlreadyExists,
}

/// Trait for credential store operations, keyed by username
#[async_trait]
pub trait UserRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn exists(&self, username: &str) -> Result<bool, AppError>;

    /// Atomically stores the user unless the username is taken.
    /// Of two concurrent inserts for one username, exactly one wins.
    async fn insert(&self, user: UserModel) -> Result<InsertUserResult, AppError>;

    /// Returns up to `limit` users in username order, skipping `offset`
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<UserModel>, AppError>;
    async fn count(&self) -> Result<usize, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is held in memory and lost when the process restarts.
pub struct InMemoryUserRepository {
    users: RwLock<BTreeMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let user_map = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();

        Self {
            users: RwLock::new(user_map),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn get_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        debug!(username = %username, "Fetching user from memory");

        let user = self.users.read().get(username).cloned();

        match &user {
            Some(u) => debug!(username = %username, user_id = %u.id, "User found in memory"),
            None => debug!(username = %username, "User not found in memory"),
        }

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.users.read().contains_key(username))
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: UserModel) -> Result<InsertUserResult, AppError> {
        debug!("Inserting user into memory");

        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            warn!("Username already exists in memory");
            return Ok(InsertUserResult::AlreadyExists);
        }
        users.insert(user.username.clone(), user);

        debug!("User stored successfully in memory");
        Ok(InsertUserResult::Inserted)
    }

    #[instrument(skip(self))]
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<UserModel>, AppError> {
        let users = self.users.read();
        let page: Vec<UserModel> = users.values().skip(offset).take(limit).cloned().collect();

        debug!(returned = page.len(), "Listed users from memory");
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.users.read().len())
    }
}
