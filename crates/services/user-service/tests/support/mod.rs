//! Shared fixtures for integration tests: an in-memory SQLite store with
//! migrations applied.

#![allow(dead_code)]

use std::sync::Arc;

use common::DatabaseConfig;
use domain::{CreateUser, CredentialHasher, DomainResult};
use user_service_lib::infra::Database;
use user_service_lib::repository::UserStore;
use user_service_lib::service::UserManager;

/// Stand-in hasher so tests don't pay for Argon2
pub struct PrefixHasher;

impl CredentialHasher for PrefixHasher {
    fn hash(&self, plain_text: &str) -> DomainResult<String> {
        Ok(format!("hashed:{}", plain_text))
    }

    fn verify(&self, plain_text: &str, hash: &str) -> bool {
        hash == format!("hashed:{}", plain_text)
    }
}

pub async fn test_db() -> Database {
    Database::connect(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database should open")
}

pub fn store(db: &Database) -> UserStore {
    UserStore::new(db.get_connection())
}

pub fn manager(db: &Database) -> UserManager {
    UserManager::new(Arc::new(store(db)), Arc::new(PrefixHasher))
}

pub fn create_request(username: &str, email: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: email.to_string(),
        full_name: "Test User".to_string(),
        password: "correct-horse-1".to_string(),
        phone_number: None,
    }
}
