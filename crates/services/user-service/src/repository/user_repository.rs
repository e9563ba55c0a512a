//! User repository implementation with optimistic locking.
//!
//! Every mutation of an existing row is a single conditional statement
//! `UPDATE users SET ... WHERE id = ? AND version = ?`. When that statement
//! touches no row the current state is re-read to tell a missing user apart
//! from a concurrent modification.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
    ActiveValue::Set,
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionTrait, UpdateMany,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::infra::migrations::{EMAIL_INDEX, USERNAME_INDEX};
use common::{AppError, AppResult};
use domain::{NewUser, User, UserChanges, UserFilter, INITIAL_VERSION};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Reads include deactivated users. Username and email lookups are
/// case-insensitive.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List users matching `filter`, newest first, with the total match count
    async fn list(&self, filter: UserFilter, offset: u64, limit: u64)
        -> AppResult<(Vec<User>, u64)>;

    /// Check whether a username is in use, ignoring `exclude_id`
    async fn username_exists(&self, username: &str, exclude_id: Option<Uuid>) -> AppResult<bool>;

    /// Check whether an email is in use, ignoring `exclude_id`
    async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool>;

    /// Insert a new user at version 1
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Apply `changes` if the stored version still equals `expected_version`
    async fn update_if_version(
        &self,
        id: Uuid,
        expected_version: i32,
        changes: UserChanges,
        updated_by: Option<String>,
    ) -> AppResult<User>;

    /// Set the active flag if the stored version still equals `expected_version`
    async fn set_active_if_version(
        &self,
        id: Uuid,
        expected_version: i32,
        active: bool,
        updated_by: Option<String>,
    ) -> AppResult<User>;

    /// Permanently delete user from database (no version check)
    async fn hard_delete(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM-backed implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Start an update that bumps version and modification metadata.
    fn versioned_update(updated_by: Option<String>) -> UpdateMany<UserEntity> {
        let update = UserEntity::update_many()
            .col_expr(
                user::Column::Version,
                Expr::col(user::Column::Version).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()));

        match updated_by {
            Some(actor) => update.col_expr(user::Column::UpdatedBy, Expr::value(actor)),
            None => update,
        }
    }

    /// Run `update` guarded by `id` and `expected_version`, returning the
    /// post-update row.
    ///
    /// The write and the follow-up read share one transaction so the returned
    /// record is exactly the one this statement produced.
    async fn execute_conditional(
        &self,
        id: Uuid,
        expected_version: i32,
        update: UpdateMany<UserEntity>,
        attempted_email: Option<&str>,
    ) -> AppResult<User> {
        let txn = self.db.begin().await?;

        let result = update
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Version.eq(expected_version))
            .exec(&txn)
            .await
            .map_err(|e| map_write_error(e, None, attempted_email))?;

        match result.rows_affected {
            1 => {
                let model = UserEntity::find_by_id(id).one(&txn).await?.ok_or_else(|| {
                    AppError::store(format!("user {} vanished after conditional update", id))
                })?;
                txn.commit().await?;
                Ok(User::from(model))
            }
            0 => {
                let current = UserEntity::find_by_id(id).one(&txn).await?;
                txn.commit().await?;
                Err(resolve_zero_rows(
                    id,
                    expected_version,
                    current.map(|m| m.version),
                ))
            }
            // Dropping the transaction rolls the statement back
            n => Err(AppError::store(format!(
                "conditional update of user {} affected {} rows",
                id, n
            ))),
        }
    }
}

/// Explain why a conditional write guarded by `id` + `expected_version`
/// touched no row, given the version currently stored (if any).
pub fn resolve_zero_rows(id: Uuid, expected_version: i32, current_version: Option<i32>) -> AppError {
    match current_version {
        None => AppError::not_found(id),
        Some(actual) if actual != expected_version => {
            tracing::warn!(
                user_id = %id,
                expected_version,
                actual_version = actual,
                "Optimistic lock conflict"
            );
            AppError::version_conflict(id, expected_version, Some(actual))
        }
        Some(_) => AppError::store(format!(
            "conditional write on user {} matched version {} but updated no rows",
            id, expected_version
        )),
    }
}

/// Translate unique-index violations into uniqueness errors.
fn map_write_error(err: DbErr, username: Option<&str>, email: Option<&str>) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        if detail.contains(USERNAME_INDEX) {
            return AppError::UsernameTaken(username.unwrap_or_default().to_string());
        }
        if detail.contains(EMAIL_INDEX) {
            return AppError::EmailTaken(email.unwrap_or_default().to_string());
        }
    }
    AppError::from(err)
}

/// `LOWER(column) = LOWER(value)`
fn lower_eq(column: user::Column, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(Func::lower(Expr::val(value)))
}

/// `LOWER(column) LIKE '%value%'` with `value` matched literally
fn lower_contains(column: user::Column, value: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&value.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Escape LIKE metacharacters so they match themselves
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(lower_eq(user::Column::Username, username))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(lower_eq(user::Column::Email, email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn list(
        &self,
        filter: UserFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<User>, u64)> {
        let mut query = UserEntity::find();

        if let Some(username) = filter.username.as_deref() {
            query = query.filter(lower_contains(user::Column::Username, username));
        }
        if let Some(email) = filter.email.as_deref() {
            query = query.filter(lower_contains(user::Column::Email, email));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(user::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let mut query = UserEntity::find().filter(lower_eq(user::Column::Username, username));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let mut query = UserEntity::find().filter(lower_eq(user::Column::Email, email));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let username = new_user.username.clone();
        let email = new_user.email.clone();

        let active_model = ActiveModel {
            id: Set(id),
            username: Set(new_user.username),
            email: Set(new_user.email),
            full_name: Set(new_user.full_name),
            password_hash: Set(new_user.password_hash),
            phone_number: Set(new_user.phone_number),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(new_user.created_by.clone()),
            updated_by: Set(new_user.created_by),
            version: Set(INITIAL_VERSION),
        };

        let rows = UserEntity::insert(active_model)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| map_write_error(e, Some(&username), Some(&email)))?;

        if rows == 0 {
            return Err(AppError::store(format!(
                "insert of user '{}' affected no rows",
                username
            )));
        }

        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::store(format!("user {} missing after insert", id)))
    }

    async fn update_if_version(
        &self,
        id: Uuid,
        expected_version: i32,
        changes: UserChanges,
        updated_by: Option<String>,
    ) -> AppResult<User> {
        let attempted_email = changes.email.clone();
        let mut update = Self::versioned_update(updated_by);

        // Only columns present in the change set are assigned
        if let Some(email) = changes.email {
            update = update.col_expr(user::Column::Email, Expr::value(email));
        }
        if let Some(full_name) = changes.full_name {
            update = update.col_expr(user::Column::FullName, Expr::value(full_name));
        }
        if let Some(phone_number) = changes.phone_number {
            update = update.col_expr(user::Column::PhoneNumber, Expr::value(phone_number));
        }
        if let Some(password_hash) = changes.password_hash {
            update = update.col_expr(user::Column::PasswordHash, Expr::value(password_hash));
        }
        if let Some(is_active) = changes.is_active {
            update = update.col_expr(user::Column::IsActive, Expr::value(is_active));
        }

        self.execute_conditional(id, expected_version, update, attempted_email.as_deref())
            .await
    }

    async fn set_active_if_version(
        &self,
        id: Uuid,
        expected_version: i32,
        active: bool,
        updated_by: Option<String>,
    ) -> AppResult<User> {
        let update = Self::versioned_update(updated_by)
            .col_expr(user::Column::IsActive, Expr::value(active));

        self.execute_conditional(id, expected_version, update, None)
            .await
    }

    async fn hard_delete(&self, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(id));
        }

        Ok(())
    }
}
