use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::UserModel,
    password::PasswordService,
    repository::{InsertUserResult, UserRepository},
    types::{LoginRequest, Pagination, RegisterRequest, UserPage, UserResponse},
    validation::{non_blank, validate_registration},
};
use crate::middleware::RequestContext;
use crate::shared::AppError;

/// Service for handling user business logic
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    passwords: PasswordService,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>, passwords: PasswordService) -> Self {
        Self {
            repository,
            passwords,
        }
    }

    /// Validates, hashes and stores a new user
    #[instrument(skip(self, ctx, request), fields(username = %request.username))]
    pub async fn register(
        &self,
        ctx: &RequestContext,
        request: RegisterRequest,
    ) -> Result<UserResponse, AppError> {
        validate_registration(&request)?;
        let username = request.username.trim().to_string();

        // Cheap early exit; the insert below is what actually guards uniqueness
        if self.repository.exists(&username).await? {
            warn!("Registration rejected, username taken");
            return Err(AppError::SaveFailure("username already exists".to_string()));
        }

        let password_hash = ctx
            .guard(async {
                self.passwords.hash(&request.password).await.map_err(|e| {
                    warn!(error = %e, "Password hashing failed");
                    AppError::SaveFailure("unable to save user data".to_string())
                })
            })
            .await?;

        let user = UserModel::new(
            username,
            password_hash,
            request.email.trim().to_string(),
            non_blank(&request.phone).map(str::to_string),
            non_blank(&request.address).map(str::to_string),
        );

        ctx.ensure_active()?;
        match self.repository.insert(user.clone()).await? {
            InsertUserResult::Inserted => {
                info!(user_id = %user.id, "User registered");
                Ok(UserResponse::from(user))
            }
            InsertUserResult::AlreadyExists => {
                warn!("Registration lost race, username taken");
                Err(AppError::SaveFailure("username already exists".to_string()))
            }
        }
    }

    /// Checks credentials, returning the stored user on success
    #[instrument(skip(self, ctx, request), fields(username = %request.username))]
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        request: &LoginRequest,
    ) -> Result<UserModel, AppError> {
        let existing = self.repository.get_by_username(request.username.trim()).await?;

        let verified = ctx
            .guard(async {
                let outcome = match &existing {
                    Some(user) => self.passwords.verify(&user.password_hash, &request.password).await,
                    None => self.passwords.reject_unknown(&request.password).await,
                };
                outcome.map_err(|e| {
                    warn!(error = %e, "Password verification failed");
                    AppError::ReadFailure("unable to verify credentials".to_string())
                })
            })
            .await?;

        match existing {
            Some(user) if verified => {
                debug!(user_id = %user.id, "Credentials accepted");
                Ok(user)
            }
            _ => {
                warn!("Invalid username or password");
                Err(AppError::Unauthorized("invalid username or password".to_string()))
            }
        }
    }

    /// Lists one page of users; a page with nothing on it is `NotFound`
    #[instrument(skip(self))]
    pub async fn list_users(&self, pagination: Pagination) -> Result<UserPage, AppError> {
        let users = self
            .repository
            .list_page(pagination.offset(), pagination.per_page)
            .await?;

        if users.is_empty() {
            debug!("Requested page is empty");
            return Err(AppError::NotFound("no users found".to_string()));
        }

        let total = self.repository.count().await?;

        Ok(UserPage {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination,
            total,
        })
    }
}
