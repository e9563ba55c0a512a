//! Repository layer for data access.

pub mod entities;
mod user_repository;

pub use user_repository::{resolve_zero_rows, UserRepository, UserStore};

// Export mock for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
