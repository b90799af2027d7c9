//! Outgoing request decoration for calls to the auth API.
//!
//! Every call carries a fresh request ID, the current trace context when one
//! exists, and the stored session token unless the call is itself a login.

use opentelemetry::trace::TraceContextExt;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::Request;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::error::AuthError;

/// gRPC metadata key carrying the session token.
pub const AUTH_TOKEN_KEY: &str = "authn-token";

pub const TRACEPARENT_KEY: &str = "traceparent";

pub const TRACESTATE_KEY: &str = "tracestate";

/// Correlation ID, also logged by the caller.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Attach a session token to an outgoing request.
pub fn inject_auth_token<T>(request: &mut Request<T>, token: &str) -> Result<(), AuthError> {
    let value = MetadataValue::<Ascii>::try_from(token).map_err(|_| {
        AuthError::Validation("stored token contains characters not allowed in metadata".into())
    })?;
    request.metadata_mut().insert(AUTH_TOKEN_KEY, value);
    Ok(())
}

/// Propagate the active span as W3C `traceparent`/`tracestate` metadata.
/// Nothing is added when there is no sampled OpenTelemetry span.
pub fn inject_trace_context<T>(request: &mut Request<T>) {
    let otel_context = Span::current().context();
    let span_ref = otel_context.span();
    let sc = span_ref.span_context();
    if !sc.is_valid() {
        return;
    }

    let metadata = request.metadata_mut();
    let traceparent = format!("00-{}-{}-{:02x}", sc.trace_id(), sc.span_id(), sc.trace_flags().to_u8());
    if let Ok(value) = MetadataValue::<Ascii>::try_from(traceparent.as_str()) {
        metadata.insert(TRACEPARENT_KEY, value);
    }
    let tracestate = sc.trace_state().header();
    if tracestate.is_empty() {
        return;
    }
    if let Ok(value) = MetadataValue::<Ascii>::try_from(tracestate.as_str()) {
        metadata.insert(TRACESTATE_KEY, value);
    }
}

/// Tag a request with a fresh correlation ID and return it.
pub fn inject_request_id<T>(request: &mut Request<T>) -> String {
    let request_id = uuid::Uuid::new_v4().to_string();
    if let Ok(value) = MetadataValue::<Ascii>::try_from(request_id.as_str()) {
        request.metadata_mut().insert(REQUEST_ID_KEY, value);
    }
    request_id
}

/// Build an outgoing request with token, trace context and request ID.
pub fn outgoing<T>(message: T, token: Option<&str>) -> Result<(Request<T>, String), AuthError> {
    let mut request = Request::new(message);
    if let Some(token) = token {
        inject_auth_token(&mut request, token)?;
    }
    inject_trace_context(&mut request);
    let request_id = inject_request_id(&mut request);
    Ok((request, request_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_auth_token() {
        let mut request = Request::new(());
        inject_auth_token(&mut request, "abc123").unwrap();
        assert_eq!(
            request
                .metadata()
                .get(AUTH_TOKEN_KEY)
                .and_then(|v| v.to_str().ok()),
            Some("abc123")
        );
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let mut request = Request::new(());
        let result = inject_auth_token(&mut request, "abc\n123");
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[test]
    fn test_outgoing_without_token() {
        let (request, request_id) = outgoing((), None).unwrap();
        assert!(request.metadata().get(AUTH_TOKEN_KEY).is_none());
        assert_eq!(
            request
                .metadata()
                .get(REQUEST_ID_KEY)
                .and_then(|v| v.to_str().ok()),
            Some(request_id.as_str())
        );
    }

    #[test]
    fn test_no_trace_context_without_span() {
        let mut request = Request::new(());
        inject_trace_context(&mut request);
        assert!(request.metadata().get(TRACEPARENT_KEY).is_none());
    }
}
