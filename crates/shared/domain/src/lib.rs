//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the user record, request payloads, the partial change set applied by
//! conditional updates, request validation and credential hashing.

pub mod constants;
pub mod error;
pub mod password;
pub mod user;
pub mod validation;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::{Argon2Hasher, CredentialHasher};
pub use user::{CreateUser, NewUser, UpdateUser, User, UserChanges, UserFilter, UserResponse};
pub use validation::{validate_request, FieldError};
