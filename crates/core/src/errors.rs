use thiserror::Error;

/// Infrastructure faults raised by a directory backend. A lookup that
/// finds nothing is not an error anywhere in this crate; operations
/// report that as `Ok(None)` and reserve this type for the cases where
/// the directory itself could not answer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("directory unavailable: {message}")]
    Unavailable { message: String },
    #[error("directory protocol fault: {message}")]
    Protocol { message: String },
}

impl DirectoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol { message: message.into() }
    }

    /// Whether retrying the same call later could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => {
                "The directory is temporarily unreachable. Please retry shortly."
            }
            Self::Protocol { .. } => "The directory returned an unexpected response.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DirectoryError;

    #[test]
    fn unavailable_is_transient_and_retryable() {
        let error = DirectoryError::unavailable("connection refused");
        assert!(error.is_transient());
        assert_eq!(error.to_string(), "directory unavailable: connection refused");
        assert_eq!(
            error.user_message(),
            "The directory is temporarily unreachable. Please retry shortly."
        );
    }

    #[test]
    fn protocol_fault_is_not_transient() {
        let error = DirectoryError::protocol("malformed search response");
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "directory protocol fault: malformed search response");
        assert_eq!(error.user_message(), "The directory returned an unexpected response.");
    }
}
