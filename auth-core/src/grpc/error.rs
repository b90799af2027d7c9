//! Classification of `tonic::Status` failures into `AuthError`.
//!
//! This is the only place remote failures are inspected. The mapping is:
//!
//! | gRPC Status | AuthError |
//! |-------------|-----------|
//! | `UNAVAILABLE` + "partially activated" | `PartiallyActivated` |
//! | any + "not activated" | `NotActivated` |
//! | `ALREADY_EXISTS` or "already activated" | `AlreadyActivated` |
//! | `UNAUTHENTICATED` on Authenticate | `InvalidProof` |
//! | `UNAUTHENTICATED` elsewhere | `NotAuthenticated` |
//! | `PERMISSION_DENIED` | `PermissionDenied` |
//! | `INVALID_ARGUMENT` | `Validation` |
//! | `DEADLINE_EXCEEDED` | `Timeout` |
//! | `UNAVAILABLE` (other) | `Connection` |
//! | everything else | `Remote` |

use tonic::{Code, Status};

use crate::error::AuthError;

const PARTIALLY_ACTIVATED_MARKER: &str = "partially activated";
const NOT_ACTIVATED_MARKER: &str = "not activated";
const ALREADY_ACTIVATED_MARKER: &str = "already activated";

/// Canonical server messages for the activation-state failures.
pub const PARTIALLY_ACTIVATED_MESSAGE: &str = "the auth service is partially activated";
pub const NOT_ACTIVATED_MESSAGE: &str = "the auth service is not activated";
pub const ALREADY_ACTIVATED_MESSAGE: &str = "the auth service is already activated";

/// Strip transport-internal noise (`rpc error: code = X desc = `) from a
/// message. Nested wrappers are removed repeatedly.
pub fn scrub_message(message: &str) -> String {
    let mut current = message.trim();
    while let Some(rest) = current.strip_prefix("rpc error: ") {
        match rest.find(" desc = ") {
            Some(idx) => current = rest[idx + " desc = ".len()..].trim(),
            None => break,
        }
    }
    current.to_string()
}

/// Which RPC produced the status; authentication failures are only an
/// invalid proof when they come from the Authenticate call itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcKind {
    Authenticate,
    Other,
}

/// Convert a status returned by the given RPC into an `AuthError`.
pub fn classify_status(status: &Status, rpc: RpcKind) -> AuthError {
    let message = scrub_message(status.message());
    let lowered = message.to_lowercase();

    if lowered.contains(PARTIALLY_ACTIVATED_MARKER) {
        return AuthError::PartiallyActivated(message);
    }
    if lowered.contains(NOT_ACTIVATED_MARKER) {
        return AuthError::NotActivated(message);
    }
    if lowered.contains(ALREADY_ACTIVATED_MARKER) {
        return AuthError::AlreadyActivated(message);
    }

    match status.code() {
        Code::Unauthenticated => match rpc {
            RpcKind::Authenticate => AuthError::InvalidProof(message),
            RpcKind::Other => AuthError::NotAuthenticated(message),
        },
        Code::AlreadyExists => AuthError::AlreadyActivated(message),
        Code::PermissionDenied => AuthError::PermissionDenied(message),
        Code::InvalidArgument => AuthError::Validation(message),
        Code::DeadlineExceeded | Code::Cancelled => AuthError::Timeout(message),
        Code::Unavailable => AuthError::Connection(message),
        _ => AuthError::Remote(message),
    }
}

impl From<Status> for AuthError {
    fn from(status: Status) -> Self {
        classify_status(&status, RpcKind::Other)
    }
}
