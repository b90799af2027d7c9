use thiserror::Error;

/// Guidance appended to every partially-activated failure.
pub const PARTIALLY_ACTIVATED_GUIDANCE: &str = "if the cluster is stuck in this state, you can \
revert by running 'authctl auth deactivate' or retry by running 'authctl auth activate' again";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid scope {0:?}: expected one of none, reader, writer, owner")]
    InvalidScope(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("operation aborted")]
    Aborted,

    #[error("could not connect: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("invalid or expired proof: {0}")]
    InvalidProof(String),

    #[error("{0}: {guidance}", guidance = PARTIALLY_ACTIVATED_GUIDANCE)]
    PartiallyActivated(String),

    #[error("the auth service is not activated: {0}")]
    NotActivated(String),

    #[error("the auth service is already activated: {0}")]
    AlreadyActivated(String),

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Remote(String),

    #[error("could not read from the terminal: {0}")]
    Input(std::io::Error),

    #[error("Credential error: {0}")]
    Credential(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AuthError {
    /// Transport failures that a caller may reasonably retry by hand.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Timeout(_) | AuthError::Connection(_))
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Credential(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Credential(anyhow::Error::new(err))
    }
}

impl From<tonic::transport::Error> for AuthError {
    fn from(err: tonic::transport::Error) -> Self {
        AuthError::Connection(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
