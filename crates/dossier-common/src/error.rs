//! Error types for the dossier workspace

use thiserror::Error;

/// Result type alias for dossier operations
pub type Result<T> = std::result::Result<T, DossierError>;

/// Main error type for dossier operations
///
/// Provider connectivity and parse failures normally never reach a caller:
/// the step boundary turns them into a "no data" table. The variants here are
/// the ones that do surface.
#[derive(Error, Debug)]
pub enum DossierError {
    #[error(
        "Workflow '{workflow}' is in {current}, but '{operation}' requires {required}"
    )]
    StageViolation {
        workflow: String,
        current: String,
        required: String,
        operation: String,
    },

    #[error("Step '{step}' has no filter attached")]
    FilterNotSet { step: String },

    #[error("Workflow '{workflow}' has no search parameter set")]
    MissingSearchParam { workflow: String },

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Step '{step}' not found in workflow '{workflow}'")]
    StepNotFound { workflow: String, step: String },

    #[error("Method '{method}' is not available on step '{step}'")]
    MethodNotFound { step: String, method: String },

    #[error("Invalid filter descriptor: {0}")]
    InvalidFilter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DossierError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the error was caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DossierError::StageViolation { .. }
                | DossierError::FilterNotSet { .. }
                | DossierError::MissingSearchParam { .. }
                | DossierError::WorkflowNotFound(_)
                | DossierError::StepNotFound { .. }
                | DossierError::MethodNotFound { .. }
                | DossierError::InvalidFilter(_)
                | DossierError::Configuration(_)
        )
    }

    /// Short machine-readable code for API envelopes
    pub fn code(&self) -> &'static str {
        match self {
            DossierError::StageViolation { .. } => "STAGE_VIOLATION",
            DossierError::FilterNotSet { .. } => "FILTER_NOT_SET",
            DossierError::MissingSearchParam { .. } => "MISSING_SEARCH_PARAM",
            DossierError::WorkflowNotFound(_) => "WORKFLOW_NOT_FOUND",
            DossierError::StepNotFound { .. } => "STEP_NOT_FOUND",
            DossierError::MethodNotFound { .. } => "METHOD_NOT_FOUND",
            DossierError::InvalidFilter(_) => "INVALID_FILTER",
            DossierError::Configuration(_) => "CONFIGURATION_ERROR",
            DossierError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_violation_message_names_all_parts() {
        let err = DossierError::StageViolation {
            workflow: "gene_report".to_string(),
            current: "stage_1".to_string(),
            required: "stage_2".to_string(),
            operation: "set_search_param".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("gene_report"));
        assert!(msg.contains("stage_1"));
        assert!(msg.contains("stage_2"));
        assert!(msg.contains("set_search_param"));
        assert!(err.is_client_error());
        assert_eq!(err.code(), "STAGE_VIOLATION");
    }

    #[test]
    fn test_serialization_error_is_not_client_error() {
        let err = DossierError::from(serde_json::from_str::<u32>("nope").unwrap_err());
        assert!(!err.is_client_error());
        assert_eq!(err.code(), "SERIALIZATION_ERROR");
    }
}
