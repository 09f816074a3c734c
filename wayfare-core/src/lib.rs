pub mod payment;

/// Error taxonomy shared by every domain service. The API layer maps each
/// variant onto an HTTP status; services only pick the variant and message.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a storage-layer failure. Repositories surface opaque errors;
    /// everything reaching a client through this path is a 500.
    pub fn storage(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Internal(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
