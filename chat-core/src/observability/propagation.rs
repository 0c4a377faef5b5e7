//! Correlation for outgoing API calls.
//!
//! Each [`OutgoingRequest`] runs inside its own `api_request` span and carries
//! the W3C `traceparent`/`tracestate` of that span plus a fresh
//! `x-request-id`, so backend logs line up with client traces.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::{Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `traceparent` for `span`, or `None` when it has no valid OpenTelemetry
/// context (no OTLP layer installed).
pub fn traceparent(span: &Span) -> Option<(String, String)> {
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();
    if !span_context.is_valid() {
        return None;
    }

    let parent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    Some((parent, span_context.trace_state().header()))
}

/// Correlation headers for a request sent from within `span`.
pub fn correlation_headers(span: &Span, request_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some((parent, state)) = traceparent(span) {
        if let Ok(value) = HeaderValue::from_str(&parent) {
            headers.insert(TRACEPARENT_HEADER, value);
        }
        if !state.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&state) {
                headers.insert(TRACESTATE_HEADER, value);
            }
        }
    }
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers
}

/// Request ID echoed back by the server, if any.
pub fn response_request_id(response: &Response) -> Option<String> {
    response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// A request that is sent inside an `api_request` span with correlation headers.
pub struct OutgoingRequest {
    method: Method,
    url: String,
    builder: RequestBuilder,
}

impl OutgoingRequest {
    pub fn new(client: &Client, method: Method, url: &str) -> Self {
        Self {
            builder: client.request(method.clone(), url),
            method,
            url: url.to_string(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Adjust the underlying builder (body, query, auth).
    pub fn with(self, adjust: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            builder: adjust(self.builder),
            ..self
        }
    }

    /// Send with a fresh request ID. Returns the ID alongside the outcome.
    pub async fn send(self) -> (String, Result<Response, reqwest::Error>) {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::debug_span!(
            "api_request",
            method = %self.method,
            url = %self.url,
            request_id = %request_id,
        );

        let headers = correlation_headers(&span, &request_id);
        let result = self.builder.headers(headers).send().instrument(span).await;
        (request_id, result)
    }
}
