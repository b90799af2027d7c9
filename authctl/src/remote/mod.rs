//! The remote authorization service, as seen from this client.

pub mod grpc;
pub mod mock;

use async_trait::async_trait;
use auth_core::AuthResult;
use serde::Serialize;

use crate::credential::Credential;
use crate::identity::{ActivationGrant, Proof};
use crate::scope::Scope;

pub use grpc::GrpcAuthApi;
pub use mock::MockAuthApi;

/// One entry of a repo's access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    pub username: String,
    pub repo: String,
    pub scope: Scope,
}

/// Answer to "who am I" for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub username: String,
    pub ttl_seconds: Option<i64>,
}

/// Request/response operations of the cluster's auth API. Implementations
/// attach the caller's current credential themselves.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a proof for a session credential.
    async fn authenticate(&self, proof: Proof) -> AuthResult<Credential>;

    /// Turn access control on, designating the first admin.
    async fn activate(&self, grant: ActivationGrant) -> AuthResult<Credential>;

    /// Turn access control off, discarding every ACL, token and admin.
    async fn deactivate(&self) -> AuthResult<()>;

    async fn authorize(&self, repo: &str, scope: Scope) -> AuthResult<bool>;

    async fn get_acl(&self, repo: &str) -> AuthResult<Vec<AccessGrant>>;

    /// Scopes `username` holds, one per entry of `repos`, in order.
    async fn get_scopes(&self, username: &str, repos: &[String]) -> AuthResult<Vec<Scope>>;

    async fn set_scope(&self, username: &str, scope: Scope, repo: &str) -> AuthResult<()>;

    async fn get_admins(&self) -> AuthResult<Vec<String>>;

    async fn modify_admins(&self, add: &[String], remove: &[String]) -> AuthResult<()>;

    /// Mint a credential for `subject`; admin only.
    async fn get_auth_token(&self, subject: &str) -> AuthResult<Credential>;

    async fn who_am_i(&self) -> AuthResult<SessionInfo>;
}
