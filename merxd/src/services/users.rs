//! User business logic.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use merx_domain::{Email, User, UserId, UserRole, UserStatus};
use merx_store::{PageRequest, PageResponse, Paginator, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

// =============================================================================
// Request/Response types
// =============================================================================

/// Payload for creating a user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: String,

    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone: Option<String>,

    /// Defaults to USER when absent
    pub role: Option<String>,
}

/// Payload for updating a user. Absent fields are left unchanged; the
/// version is required for optimistic locking.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone: Option<String>,

    pub status: Option<String>,
    pub role: Option<String>,

    pub version: i32,
}

/// User as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            full_name: user.full_name(),
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            status: user.status,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
            version: user.version,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Service for user business logic.
pub struct UserService<S: Store> {
    store: Arc<S>,
    paginator: Paginator,
}

impl<S: Store> UserService<S> {
    pub fn new(store: Arc<S>, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    /// Create a new user.
    pub async fn create_user(&self, request: CreateUserRequest) -> ServiceResult<UserResponse> {
        request.validate()?;
        info!(email = %request.email, "creating user");

        if self.store.users().exists_by_email(&request.email).await? {
            return Err(ServiceError::Conflict(format!(
                "User with email already exists: {}",
                request.email
            )));
        }

        let mut user = User::new(
            Email::new(request.email)?,
            request.first_name,
            request.last_name,
            request.phone,
        );
        if let Some(role) = request.role.as_deref() {
            user.role = role.parse::<UserRole>()?;
        }

        let saved = self.store.users().create(&user).await?;
        info!(user_id = saved.id, "user created");

        Ok(saved.into())
    }

    /// Get user by ID.
    pub async fn get_user(&self, id: UserId) -> ServiceResult<UserResponse> {
        debug!(user_id = id, "fetching user");

        self.store
            .users()
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound(format!("User not found with ID: {}", id)))
    }

    /// Get user by email.
    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<UserResponse> {
        debug!(email, "fetching user by email");

        self.store
            .users()
            .find_by_email(email)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound(format!("User not found with email: {}", email)))
    }

    /// Get all users with pagination.
    pub async fn get_all_users(
        &self,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<UserResponse>> {
        let normalized = self.paginator.normalize(request);
        let users = self.store.users().find_all(&normalized).await?;
        let total = self.store.users().count().await?;

        let responses: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Get users by status with pagination.
    pub async fn get_users_by_status(
        &self,
        status: &str,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<UserResponse>> {
        let status = status.parse::<UserStatus>()?;

        let normalized = self.paginator.normalize(request);
        let users = self.store.users().find_by_status(status, &normalized).await?;
        let total = self.store.users().count_by_status(status).await?;

        let responses: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Search users by name.
    pub async fn search_users(
        &self,
        term: &str,
        request: &PageRequest,
    ) -> ServiceResult<PageResponse<UserResponse>> {
        let normalized = self.paginator.normalize(request);
        let users = self.store.users().search_by_name(term, &normalized).await?;

        let responses: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
        let total = responses.len() as i64;
        Ok(self.paginator.build_page_response(responses, total, &normalized))
    }

    /// Update an existing user.
    pub async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
    ) -> ServiceResult<UserResponse> {
        request.validate()?;
        info!(user_id = id, "updating user");

        let mut existing = self
            .store
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User not found with ID: {}", id)))?;

        // Check for email conflict if the email is being changed
        if let Some(email) = request.email {
            if email != existing.email.as_str() {
                if self.store.users().exists_by_email(&email).await? {
                    return Err(ServiceError::Conflict(format!(
                        "User with email already exists: {}",
                        email
                    )));
                }
                existing.email = Email::new(email)?;
            }
        }

        if let Some(first_name) = request.first_name {
            existing.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            existing.last_name = last_name;
        }
        if let Some(phone) = request.phone {
            existing.phone = Some(phone);
        }
        if let Some(status) = request.status.as_deref() {
            existing.status = status.parse::<UserStatus>()?;
        }
        if let Some(role) = request.role.as_deref() {
            existing.role = role.parse::<UserRole>()?;
        }

        existing.version = request.version;

        let outcome = self.store.users().update(&existing).await?;
        if !outcome.is_applied() {
            return Err(ServiceError::Conflict(
                "User was modified by another transaction. Please refresh and try again."
                    .to_string(),
            ));
        }

        info!(user_id = id, "user updated");
        self.get_user(id).await
    }

    /// Soft delete a user.
    pub async fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        info!(user_id = id, "deleting user");

        let deleted = self.store.users().delete(id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("User not found with ID: {}", id)));
        }

        info!(user_id = id, "user deleted");
        Ok(())
    }
}
