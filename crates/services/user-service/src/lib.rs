//! User Service Library
//!
//! User account management over a relational store: creation with a
//! uniqueness guard, optimistic-locking partial updates, soft delete and
//! reactivation. The `user-service` binary exposes it as a CLI.

pub mod cli;
pub mod commands;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use common::AppResult;

use crate::config::UserServiceConfig;
use crate::infra::Database;
use crate::repository::UserStore;
use crate::service::UserManager;

/// Connect to the configured database, apply pending migrations and build
/// a [`UserManager`] backed by it.
pub async fn connect_manager(config: &UserServiceConfig) -> AppResult<UserManager> {
    let db = Database::connect(&config.database).await?;
    Ok(manager_for(&db))
}

/// Build a [`UserManager`] over an already connected database.
pub fn manager_for(db: &Database) -> UserManager {
    let user_repo = Arc::new(UserStore::new(db.get_connection()));
    UserManager::with_argon2(user_repo)
}
