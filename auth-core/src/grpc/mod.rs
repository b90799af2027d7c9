//! gRPC utilities for talking to the cluster's auth API.
//!
//! This module provides:
//! - Messages and stubs generated from `proto/auth/v1/auth.proto`
//! - A client for that service
//! - Classification of `tonic::Status` into `AuthError`
//! - Outgoing request decoration (session token, trace context, request ID)

pub mod client;
pub mod error;
pub mod interceptors;
pub mod proto;

pub use client::{AuthClient, AuthClientConfig};
pub use error::{classify_status, scrub_message, RpcKind};
pub use interceptors::{
    inject_auth_token, inject_request_id, inject_trace_context, outgoing, AUTH_TOKEN_KEY,
    REQUEST_ID_KEY, TRACEPARENT_KEY, TRACESTATE_KEY,
};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
