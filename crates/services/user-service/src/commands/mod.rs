//! Commands module - CLI command implementations.

pub mod migrate;
pub mod users;

use serde::Serialize;

use common::{AppError, AppResult};

/// Render a failure as the JSON error body printed on stderr
pub fn render_error(err: &AppError) -> String {
    serde_json::to_string_pretty(&err.to_response()).unwrap_or_else(|_| err.user_message())
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Failed to render output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_render_error_for_conflict() {
        let err = AppError::version_conflict(Uuid::new_v4(), 1, Some(2));
        let body: serde_json::Value = serde_json::from_str(&render_error(&err)).unwrap();

        assert_eq!(body["error"]["code"], "VERSION_MISMATCH");
        assert!(body["error"].get("fields").is_none());
    }

    #[test]
    fn test_render_error_lists_invalid_fields() {
        let err = AppError::validation("yes", "permanent deletion must be confirmed with --yes");
        let body: serde_json::Value = serde_json::from_str(&render_error(&err)).unwrap();

        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"][0]["field"], "yes");
    }

    #[test]
    fn test_render_error_hides_store_details() {
        let err = AppError::store("UPDATE users affected 3 rows");
        let rendered = render_error(&err);

        assert!(rendered.contains("STORE_ERROR"));
        assert!(!rendered.contains("affected 3 rows"));
    }
}
