//! Error types for the rubric editor and its backend synchronization.

use thiserror::Error;

/// Every failure the rubric editor can surface to its caller.
///
/// Editing errors (`InvalidNumber`, `UnsupportedField`, `EditorClosed`) leave the draft
/// untouched. Submission errors (`AuthorizationMissing`, `MissingIdentifier`,
/// `SubjectMismatch`, `Network`,
/// `Server`, `ServerRejected`, `MalformedResponse`) are raised at the fetch/submit
/// boundary and also leave the draft intact so the user may retry manually.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RubricError {
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("No authentication token available")]
    AuthorizationMissing,

    #[error("Missing identifier: {0}")]
    MissingIdentifier(&'static str),

    #[error("Rubrics of {editor} cannot be saved under {target}")]
    SubjectMismatch { editor: String, target: String },

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Server responded with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Server rejected the request: {0}")]
    ServerRejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Weights must total 100% (current total: {sum})")]
    ValidationFailure { sum: f64 },

    #[error("Field {field} is not available for {variant} rubrics")]
    UnsupportedField {
        field: &'static str,
        variant: &'static str,
    },

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("The rubric editor is not open")]
    EditorClosed,
}

impl RubricError {
    /// Text shown to the user in the alert/inline indicator for this error.
    pub fn user_message(&self) -> String {
        match self {
            RubricError::InvalidNumber(raw) => {
                format!("\"{}\" is not a valid percentage", raw.trim())
            }
            RubricError::AuthorizationMissing => {
                "Your session has expired. Please log in again.".to_string()
            }
            RubricError::MissingIdentifier(what) => format!("No {} selected", what),
            RubricError::SubjectMismatch { editor, target } => format!(
                "These rubrics belong to {}, they cannot be saved under {}",
                editor, target
            ),
            RubricError::Network(_) => {
                "Could not reach the server. Your changes were kept, please try again.".to_string()
            }
            RubricError::Server { status, .. } => format!(
                "The server could not save the rubrics (HTTP {}). Your changes were kept.",
                status
            ),
            RubricError::ServerRejected(message) => message.clone(),
            RubricError::MalformedResponse(_) => {
                "The server sent an unexpected response.".to_string()
            }
            RubricError::ValidationFailure { sum } => format!(
                "The weights add up to {}, they must add up to 100%",
                crate::weight::format_percent(*sum)
            ),
            RubricError::UnsupportedField { field, .. } => {
                format!("The field {} cannot be edited here", field)
            }
            RubricError::Credentials(message) => message.clone(),
            RubricError::EditorClosed => "The rubric editor is closed".to_string(),
        }
    }

    /// True when the failure came from the backend round trip and the untouched draft
    /// can simply be submitted again.
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(
            self,
            RubricError::Network(_)
                | RubricError::Server { .. }
                | RubricError::ServerRejected(_)
                | RubricError::MalformedResponse(_)
        )
    }
}

/// Result type alias for the rubric editor.
pub type Result<T> = std::result::Result<T, RubricError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_message_shows_percentage() {
        let err = RubricError::ValidationFailure { sum: 1.1 };
        assert_eq!(
            err.user_message(),
            "The weights add up to 110%, they must add up to 100%"
        );
        assert!(!err.is_retryable_by_user());
    }

    #[test]
    fn test_backend_failures_are_retryable() {
        assert!(RubricError::Network("timeout".to_string()).is_retryable_by_user());
        assert!(RubricError::Server {
            status: 500,
            message: String::new()
        }
        .is_retryable_by_user());
        assert!(!RubricError::AuthorizationMissing.is_retryable_by_user());
    }
}
