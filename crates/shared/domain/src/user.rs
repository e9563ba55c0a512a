//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_password_strength, validate_phone_number, USERNAME_REGEX};

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Optimistic locking counter, bumped by every successful mutation
    pub version: i32,
}

impl User {
    /// Check if user has been soft deleted
    pub fn is_deactivated(&self) -> bool {
        !self.is_active
    }
}

/// User creation payload
#[derive(Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(
        length(min = 3, max = 50, message = "must be between 3 and 50 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "may only contain letters, digits and underscores"
        )
    )]
    pub username: String,

    #[validate(
        email(message = "must be a valid email address"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub email: String,

    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub full_name: String,

    #[validate(
        length(min = 8, max = 128, message = "must be between 8 and 128 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,

    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
}

// Keep the plain-text password out of logs
impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

/// Partial user update payload.
///
/// Only the fields that are `Some` are written; `version` is the version the
/// caller last read and is required.
#[derive(Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub full_name: Option<String>,

    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,

    #[validate(
        length(min = 8, max = 128, message = "must be between 8 and 128 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: Option<String>,

    pub is_active: Option<bool>,

    /// Not range-checked; a version no row carries resolves as not found or
    /// conflict like any other.
    pub version: i32,
}

impl std::fmt::Debug for UpdateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUser")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("phone_number", &self.phone_number)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("is_active", &self.is_active)
            .field("version", &self.version)
            .finish()
    }
}

/// Fully prepared row for insertion (credential already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub created_by: Option<String>,
}

/// Change set for a conditional update.
///
/// Every `None` field is left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    /// Names of the columns this change set writes
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.email.is_some() {
            fields.push("email");
        }
        if self.full_name.is_some() {
            fields.push("full_name");
        }
        if self.phone_number.is_some() {
            fields.push("phone_number");
        }
        if self.password_hash.is_some() {
            fields.push("password_hash");
        }
        if self.is_active.is_some() {
            fields.push("is_active");
        }
        fields
    }
}

/// Listing filters. String filters match substrings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub version: i32,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            created_by: user.created_by,
            updated_by: user.updated_by,
            version: user.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_request;

    fn valid_create() -> CreateUser {
        CreateUser {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice Liddell".to_string(),
            password: "wonderland1".to_string(),
            phone_number: None,
        }
    }

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            phone_number: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
            version: 1,
        }
    }

    #[test]
    fn test_valid_create_request_passes() {
        assert!(validate_request(&valid_create()).is_ok());
    }

    #[test]
    fn test_create_request_collects_every_bad_field() {
        let request = CreateUser {
            username: "a!".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            ..valid_create()
        };

        let errors = validate_request(&request).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(!fields.contains(&"full_name"));
    }

    #[test]
    fn test_create_request_rejects_bad_phone() {
        let request = CreateUser {
            phone_number: Some("12".to_string()),
            ..valid_create()
        };

        let errors = validate_request(&request).unwrap_err();
        assert!(errors.iter().all(|e| e.field == "phone_number"));
    }

    #[test]
    fn test_update_request_absent_fields_are_not_validated() {
        let request = UpdateUser {
            version: 3,
            ..Default::default()
        };

        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_update_request_does_not_range_check_version() {
        for version in [0, -1] {
            let request = UpdateUser {
                full_name: Some("Alice".to_string()),
                version,
                ..Default::default()
            };
            assert!(validate_request(&request).is_ok());
        }
    }

    #[test]
    fn test_password_needs_letter_and_digit() {
        for password in ["onlyletters", "1234567890"] {
            let request = CreateUser {
                password: password.to_string(),
                ..valid_create()
            };
            let errors = validate_request(&request).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "password");
        }

        let update = UpdateUser {
            password: Some("nodigitshere".to_string()),
            version: 1,
            ..Default::default()
        };
        assert!(validate_request(&update).is_err());
    }

    #[test]
    fn test_password_length_bounds() {
        let too_long = CreateUser {
            password: format!("a1{}", "x".repeat(127)),
            ..valid_create()
        };
        assert!(validate_request(&too_long).is_err());

        let longest = CreateUser {
            password: format!("a1{}", "x".repeat(126)),
            ..valid_create()
        };
        assert!(validate_request(&longest).is_ok());
    }

    #[test]
    fn test_email_capped_at_100_characters() {
        let long_email = format!("{}@x.com", "a".repeat(95));
        assert_eq!(long_email.len(), 101);

        let create = CreateUser {
            email: long_email.clone(),
            ..valid_create()
        };
        let errors = validate_request(&create).unwrap_err();
        assert!(errors.iter().all(|e| e.field == "email"));

        let update = UpdateUser {
            email: Some(long_email),
            version: 1,
            ..Default::default()
        };
        assert!(validate_request(&update).is_err());
    }

    #[test]
    fn test_empty_phone_number_is_accepted() {
        let create = CreateUser {
            phone_number: Some(String::new()),
            ..valid_create()
        };
        assert!(validate_request(&create).is_ok());

        let update = UpdateUser {
            phone_number: Some(String::new()),
            version: 1,
            ..Default::default()
        };
        assert!(validate_request(&update).is_ok());
    }

    #[test]
    fn test_username_rejects_dots_and_dashes() {
        for username in ["al.ice", "al-ice", "al.ice-x"] {
            let request = CreateUser {
                username: username.to_string(),
                ..valid_create()
            };
            let errors = validate_request(&request).unwrap_err();
            assert_eq!(errors[0].field, "username");
        }
    }

    #[test]
    fn test_update_request_validates_present_email() {
        let request = UpdateUser {
            email: Some("nope".to_string()),
            version: 1,
            ..Default::default()
        };

        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_change_set_fields() {
        let changes = UserChanges {
            email: Some("b@x.com".to_string()),
            is_active: Some(false),
            ..Default::default()
        };

        assert_eq!(changes.fields(), vec!["email", "is_active"]);
        assert!(UserChanges::default().fields().is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", valid_create());
        assert!(!rendered.contains("wonderland1"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_response_keeps_version_and_status() {
        let mut user = sample_user();
        user.is_active = false;
        user.version = 4;

        let response = UserResponse::from(user.clone());

        assert!(user.is_deactivated());
        assert!(!response.is_active);
        assert_eq!(response.version, 4);
        assert_eq!(response.id, user.id);
    }
}
