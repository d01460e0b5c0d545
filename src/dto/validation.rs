//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects strings made only of whitespace.
///
/// Length bounds are checked separately with `#[validate(length(..))]`; this
/// only catches input that is non-empty but carries no text.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must contain non-whitespace characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank_accepts_text() {
        assert!(validate_not_blank("Alice").is_ok());
        assert!(validate_not_blank("  padded  ").is_ok());
    }

    #[test]
    fn test_validate_not_blank_rejects_whitespace() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
    }
}
