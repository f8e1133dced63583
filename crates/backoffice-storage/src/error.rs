//! Error types for backoffice-storage

use thiserror::Error;

/// Result type alias for backoffice-storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in backoffice-storage
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A unique field already holds this value on another record.
    #[error("{kind} with {field} '{value}' already exists")]
    Conflict {
        /// Entity kind, e.g. "User".
        kind: &'static str,
        /// Unique field that collided.
        field: &'static str,
        /// The colliding value.
        value: String,
    },

    /// A payload could not be turned into a record of this kind.
    #[error("invalid {kind} record: {message}")]
    InvalidRecord {
        /// Entity kind, e.g. "Calculation".
        kind: &'static str,
        /// What was wrong with the payload.
        message: String,
    },

    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Creates an invalid-record error for entity kind `kind`.
    pub fn invalid_record<S: Into<String>>(kind: &'static str, message: S) -> Self {
        Error::InvalidRecord {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let e = Error::Conflict {
            kind: "User",
            field: "email",
            value: "a@example.com".to_string(),
        };
        assert_eq!(e.to_string(), "User with email 'a@example.com' already exists");
    }

    #[test]
    fn test_invalid_record_display() {
        let e = Error::invalid_record("Calculation", "missing field `ad_spend`");
        assert_eq!(
            e.to_string(),
            "invalid Calculation record: missing field `ad_spend`"
        );
    }
}
