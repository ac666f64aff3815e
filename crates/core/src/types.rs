use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Annotators are identified by the auth provider's UUID.
pub type AnnotatorId = uuid::Uuid;

/// Moderation status of a submitted annotation.
///
/// Created as `Pending`; transitioned to `Approved` or `Rejected` by the
/// moderation workflow. A rejected annotation no longer blocks the meme's
/// one-final-annotation constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    Pending,
    Approved,
    Rejected,
}

/// All valid annotation status strings.
const VALID_STATUS_STRINGS: &[&str] = &["pending", "approved", "rejected"];

impl AnnotationStatus {
    /// Return the status as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a status from its database string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid annotation status '{s}'. Must be one of: {}",
                VALID_STATUS_STRINGS.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_pending_round_trip() {
        assert_eq!(AnnotationStatus::Pending.as_str(), "pending");
        assert_eq!(
            AnnotationStatus::parse("pending").unwrap(),
            AnnotationStatus::Pending
        );
    }

    #[test]
    fn status_approved_round_trip() {
        assert_eq!(AnnotationStatus::Approved.as_str(), "approved");
        assert_eq!(
            AnnotationStatus::parse("approved").unwrap(),
            AnnotationStatus::Approved
        );
    }

    #[test]
    fn status_rejected_round_trip() {
        assert_eq!(AnnotationStatus::Rejected.as_str(), "rejected");
        assert_eq!(
            AnnotationStatus::parse("rejected").unwrap(),
            AnnotationStatus::Rejected
        );
    }

    #[test]
    fn status_invalid_rejected() {
        let err = AnnotationStatus::parse("archived").unwrap_err();
        assert!(err.to_string().contains("Invalid annotation status"));
    }

    #[test]
    fn status_empty_rejected() {
        assert!(AnnotationStatus::parse("").is_err());
    }
}
