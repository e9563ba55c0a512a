//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.
//! Length limits live next to the request fields they guard (see `user.rs`).

// =============================================================================
// Versioning
// =============================================================================

/// Version assigned to every freshly created user record
pub const INITIAL_VERSION: i32 = 1;

// =============================================================================
// Validation
// =============================================================================

/// Allowed username characters
pub const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_]+$";

/// Allowed phone number characters (digits with optional separators)
pub const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 \-]*$";
