//! Client library for a cluster's access-control service.
//!
//! Covers the session lifecycle (activate, login, logout, whoami), scope
//! checks and ACL management, cluster admins and delegated tokens. The
//! remote service sits behind [`remote::AuthApi`]; the caller's credential
//! lives behind [`credential::CredentialStore`].

pub mod authz;
pub mod cli;
pub mod credential;
pub mod exchange;
pub mod identity;
pub mod prompt;
pub mod remote;
pub mod scope;
pub mod session;

pub use authz::AuthorizationClient;
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use exchange::{CodeSource, IdentityExchange};
pub use identity::{ActivationGrant, Proof, Subject};
pub use prompt::{Prompter, ScriptedPrompter, StdinPrompter};
pub use remote::{AccessGrant, AuthApi, GrpcAuthApi, MockAuthApi, SessionInfo};
pub use scope::Scope;
pub use session::{Activation, Identity, LoginMode, SessionManager};

pub use auth_core::{AuthError, AuthResult};
