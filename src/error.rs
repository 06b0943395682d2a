//! Error types for the Visitors operator

/// Result type alias for operator operations
pub type Result<T> = std::result::Result<T, OperatorError>;

/// Errors that can occur during operator operations.
///
/// Every variant is retryable: the controller requeues the pass and relies on
/// the next watch event or backoff to make progress.
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// Kubernetes API error (network, server, or unclassified API failure)
    #[error("Kubernetes API error: {0}")]
    KubeApi(String),
    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// Optimistic concurrency collision on write
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Create raced with another writer
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<kube::Error> for OperatorError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => OperatorError::NotFound(ae.message),
            kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
                OperatorError::AlreadyExists(ae.message)
            }
            kube::Error::Api(ae) if ae.code == 409 => OperatorError::Conflict(ae.message),
            other => OperatorError::KubeApi(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for OperatorError {
    fn from(err: serde_json::Error) -> Self {
        OperatorError::Serialization(err.to_string())
    }
}
