use oak_protocol::FailureStage;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OntologyError>;

/// Fault raised by a concrete backend (network, database, malformed payload).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unknown ontology '{0}'")]
    UnknownOntology(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OntologyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid ontology reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("backend {backend} unavailable: {cause}")]
    BackendUnavailable { backend: String, cause: BackendError },

    #[error("query against {backend} failed: {cause}")]
    QueryFailed { backend: String, cause: BackendError },

    #[error("term {term_id} not found in {backend}")]
    TermNotFound { term_id: String, backend: String },
}

impl OntologyError {
    pub fn invalid_reference(reference: &str, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable snake_case code used in tool error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::QueryFailed { .. } => "query_failed",
            Self::TermNotFound { .. } => "term_not_found",
        }
    }

    pub fn backend(&self) -> Option<&str> {
        match self {
            Self::BackendUnavailable { backend, .. }
            | Self::QueryFailed { backend, .. }
            | Self::TermNotFound { backend, .. } => Some(backend),
            Self::InvalidArgument(_) | Self::InvalidReference { .. } => None,
        }
    }

    /// Whether the same call may succeed if the agent repeats it later.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::QueryFailed { .. }
        )
    }
}

/// An [`OntologyError`] annotated with the pipeline stage that raised it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} stage failed: {}", .stage.as_str(), .error)]
pub struct SearchFailure {
    pub stage: FailureStage,
    pub error: OntologyError,
}

impl SearchFailure {
    pub fn new(stage: FailureStage, error: OntologyError) -> Self {
        Self { stage, error }
    }
}
