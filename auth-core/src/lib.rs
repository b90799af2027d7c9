//! auth-core: Shared infrastructure for the authctl access-control client.
pub mod config;
pub mod error;
pub mod grpc;
pub mod observability;

pub use error::{AuthError, AuthResult};

pub use prost;
pub use tonic;
pub use tracing;
