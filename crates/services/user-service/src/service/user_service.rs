//! User service - uniqueness guard, optimistic locking and account lifecycle.
//!
//! The guard checks here are a fast-fail only. They can be stale by the time
//! the write runs; the repository's conditional statements and the store's
//! unique indexes are what actually keep the data consistent.

use std::sync::Arc;

use uuid::Uuid;

use common::{AppError, AppResult, OptionExt, Paginated, PaginationParams};
use domain::{
    validate_request, Argon2Hasher, CreateUser, CredentialHasher, NewUser, UpdateUser, User,
    UserChanges, UserFilter, UserResponse,
};

use crate::repository::UserRepository;

/// User account operations over a [`UserRepository`].
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserManager {
    /// Create new user service instance with repository and credential hasher
    pub fn new(repo: Arc<dyn UserRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { repo, hasher }
    }

    /// Create a service hashing credentials with Argon2
    pub fn with_argon2(repo: Arc<dyn UserRepository>) -> Self {
        Self::new(repo, Arc::new(Argon2Hasher::new()))
    }

    // =========================================================================
    // Uniqueness guard
    // =========================================================================

    /// Whether `username` (case-insensitive) belongs to a user other than `exclude_id`
    pub async fn is_username_taken(
        &self,
        username: &str,
        exclude_id: Option<Uuid>,
    ) -> AppResult<bool> {
        self.repo.username_exists(username, exclude_id).await
    }

    /// Whether `email` (case-insensitive) belongs to a user other than `exclude_id`
    pub async fn is_email_taken(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        self.repo.email_exists(email, exclude_id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get user by ID (active or not)
    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        tracing::debug!(user_id = %id, "Fetching user");
        self.repo.find_by_id(id).await?.ok_or_not_found(id)
    }

    /// Get user by username (case-insensitive)
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<User> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_not_found(username)
    }

    /// Get user by email (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.repo.find_by_email(email).await?.ok_or_not_found(email)
    }

    /// List users matching `filter`, one page at a time
    pub async fn list_users(
        &self,
        filter: UserFilter,
        pagination: PaginationParams,
    ) -> AppResult<Paginated<UserResponse>> {
        let (users, total) = self
            .repo
            .list(filter, pagination.offset(), pagination.limit())
            .await?;

        Ok(Paginated::new(users, pagination.page(), pagination.limit(), total)
            .map(UserResponse::from))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a user at version 1, active.
    pub async fn create_user(&self, request: CreateUser, actor: Option<String>) -> AppResult<User> {
        validate_request(&request).map_err(AppError::Validation)?;

        if self.repo.username_exists(&request.username, None).await? {
            tracing::warn!(username = %request.username, "Username already taken");
            return Err(AppError::UsernameTaken(request.username));
        }

        if self.repo.email_exists(&request.email, None).await? {
            tracing::warn!(email = %request.email, "Email already registered");
            return Err(AppError::EmailTaken(request.email));
        }

        let password_hash = self.hash_credential(request.password).await?;

        let user = self
            .repo
            .create(NewUser {
                username: request.username,
                email: request.email,
                full_name: request.full_name,
                password_hash,
                phone_number: request.phone_number,
                created_by: actor,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Apply a partial update if `request.version` is still current.
    ///
    /// Fields left `None` keep their stored value. A deactivated user cannot be
    /// switched back on here; use [`UserManager::reactivate_user`].
    pub async fn update_user(
        &self,
        id: Uuid,
        request: UpdateUser,
        actor: Option<String>,
    ) -> AppResult<User> {
        validate_request(&request).map_err(AppError::Validation)?;

        let current = self.repo.find_by_id(id).await?.ok_or_not_found(id)?;

        if current.version != request.version {
            tracing::warn!(
                user_id = %id,
                expected_version = request.version,
                actual_version = current.version,
                "Rejecting update with stale version"
            );
            return Err(AppError::version_conflict(
                id,
                request.version,
                Some(current.version),
            ));
        }

        if request.is_active == Some(true) && current.is_deactivated() {
            return Err(AppError::validation(
                "is_active",
                "deactivated users must be restored with reactivate",
            ));
        }

        if let Some(email) = request.email.as_deref() {
            if email != current.email && self.repo.email_exists(email, Some(id)).await? {
                tracing::warn!(user_id = %id, email = %email, "Email already registered");
                return Err(AppError::EmailTaken(email.to_string()));
            }
        }

        let password_hash = match request.password {
            Some(password) => Some(self.hash_credential(password).await?),
            None => None,
        };

        let changes = UserChanges {
            email: request.email,
            full_name: request.full_name,
            phone_number: request.phone_number,
            password_hash,
            is_active: request.is_active,
        };
        let fields = changes.fields();

        let user = self
            .repo
            .update_if_version(id, request.version, changes, actor)
            .await?;

        tracing::info!(
            user_id = %id,
            version = user.version,
            fields = ?fields,
            "User updated"
        );
        Ok(user)
    }

    /// Soft delete: mark the user inactive if `expected_version` is current.
    pub async fn deactivate_user(
        &self,
        id: Uuid,
        expected_version: i32,
        actor: Option<String>,
    ) -> AppResult<()> {
        let user = self
            .repo
            .set_active_if_version(id, expected_version, false, actor)
            .await?;

        tracing::info!(user_id = %id, version = user.version, "User deactivated");
        Ok(())
    }

    /// Restore a soft-deleted user if `expected_version` is current.
    pub async fn reactivate_user(
        &self,
        id: Uuid,
        expected_version: i32,
        actor: Option<String>,
    ) -> AppResult<User> {
        let user = self
            .repo
            .set_active_if_version(id, expected_version, true, actor)
            .await?;

        tracing::info!(user_id = %id, version = user.version, "User reactivated");
        Ok(user)
    }

    /// Permanently delete a user. Not version-guarded.
    pub async fn delete_user_permanently(&self, id: Uuid) -> AppResult<()> {
        self.repo.hard_delete(id).await?;
        tracing::warn!(user_id = %id, "User permanently deleted");
        Ok(())
    }

    /// Hash on the blocking pool, off the async executor.
    async fn hash_credential(&self, plain_text: String) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&plain_text))
            .await
            .map_err(|e| AppError::internal(format!("hashing task failed: {}", e)))??;
        Ok(hash)
    }
}
