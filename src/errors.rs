use thiserror::Error;

/// Guidance appended to every format-recovery failure.
pub const SIMPLIFY_HINT: &str =
    "Please try again with a simpler description, fewer special characters, or different wording.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VibeError {
    #[error("provider error: {0}")] Provider(String),
    #[error("unable to parse the AI response: {0}")] FormatRecovery(String),
    #[error("unexpected response shape: {0}")] ShapeMismatch(String),
    #[error("invalid input: {0}")] InvalidInput(String),
}

impl VibeError {
    pub fn format_recovery() -> Self {
        VibeError::FormatRecovery(SIMPLIFY_HINT.to_string())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            VibeError::InvalidInput(_) => 400,
            VibeError::Provider(_) => 502,
            VibeError::FormatRecovery(_) | VibeError::ShapeMismatch(_) => 500,
        }
    }
}

pub type VibeResult<T> = Result<T, VibeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_recovery_message_advises_simplification() {
        let err = VibeError::format_recovery();
        assert!(err.to_string().contains("simpler description"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn invalid_input_is_a_client_error() {
        assert_eq!(VibeError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(VibeError::Provider("x".into()).status_code(), 502);
    }
}
