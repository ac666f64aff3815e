//! Caption validation and sanitization.
//!
//! Pure functions shared by the submission pipeline (client-side fail-fast
//! check) and the persistence layer (authoritative re-check before the
//! final insert).

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed caption length after trimming, in characters.
pub const MAX_CAPTION_LENGTH: usize = 5000;

/// Minimum required caption length after trimming, in characters.
pub const MIN_CAPTION_LENGTH: usize = 1;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a caption string.
///
/// Rules:
/// - Must be non-empty after trimming whitespace.
/// - Trimmed length must be between [`MIN_CAPTION_LENGTH`] and
///   [`MAX_CAPTION_LENGTH`] characters inclusive.
pub fn validate_caption(caption: &str) -> Result<(), CoreError> {
    let trimmed = caption.trim();

    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Caption cannot be empty".to_string(),
        ));
    }

    let len = trimmed.chars().count();
    if len < MIN_CAPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Caption must be at least {MIN_CAPTION_LENGTH} character long"
        )));
    }
    if len > MAX_CAPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Caption cannot exceed {MAX_CAPTION_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Sanitize a caption by trimming surrounding whitespace.
///
/// This is the only transformation applied before storage; caption text is
/// otherwise preserved verbatim.
pub fn sanitize_caption(caption: &str) -> String {
    caption.trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_plain_text_accepted() {
        assert!(validate_caption("a perfectly normal caption").is_ok());
    }

    #[test]
    fn caption_single_char_accepted() {
        assert!(validate_caption("x").is_ok());
    }

    #[test]
    fn caption_at_maximum_accepted() {
        let caption = "a".repeat(MAX_CAPTION_LENGTH);
        assert!(validate_caption(&caption).is_ok());
    }

    #[test]
    fn caption_over_maximum_rejected() {
        let caption = "a".repeat(MAX_CAPTION_LENGTH + 1);
        let err = validate_caption(&caption).unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));
    }

    #[test]
    fn caption_empty_rejected() {
        let err = validate_caption("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn caption_whitespace_only_rejected() {
        assert!(validate_caption("   \t\n  ").is_err());
    }

    #[test]
    fn caption_length_counted_after_trim() {
        // Padding does not push a max-length caption over the limit.
        let caption = format!("  {}  ", "a".repeat(MAX_CAPTION_LENGTH));
        assert!(validate_caption(&caption).is_ok());
    }

    #[test]
    fn caption_multibyte_counted_by_chars() {
        let caption = "é".repeat(MAX_CAPTION_LENGTH);
        assert!(validate_caption(&caption).is_ok());
    }

    #[test]
    fn sanitize_trims_surrounding_whitespace() {
        assert_eq!(sanitize_caption("  hello world \n"), "hello world");
    }

    #[test]
    fn sanitize_preserves_interior_whitespace() {
        assert_eq!(sanitize_caption("top text\n\nbottom text"), "top text\n\nbottom text");
    }
}
