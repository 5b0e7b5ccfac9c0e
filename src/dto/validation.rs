//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a required string is not empty or whitespace-only.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that every answer option of a question is non-blank.
pub fn validate_answer_options(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|value| value.trim().is_empty()) {
        let mut err = ValidationError::new("answer_options");
        err.message = Some("answer options must not be empty".into());
        return Err(err);
    }

    Ok(())
}
