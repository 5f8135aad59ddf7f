//! Request identifiers and HTTP span plumbing.
//!
//! Every request gets an id, minted or caller-supplied, that shows up in log
//! spans and response envelopes and is echoed back to the caller.

use std::fmt;
use std::future::Future;

use axum::{
    http::{header::HeaderName, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_http::{
    classify::{SharedClassifier, StatusInRangeAsFailures},
    trace::{MakeSpan, TraceLayer},
};
use uuid::Uuid;

/// Header carrying the request id, inbound and outbound.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Opaque id correlating one HTTP request across logs and responses.
#[derive(Clone, Debug)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RequestId;
}

/// Runs `future` with `request_id` visible to [`current_request_id`].
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID.scope(request_id, future).await
}

/// The id of the request currently being served, if any.
pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID.try_with(|rid| rid.clone()).ok()
}

fn header_request_id(headers: &HeaderMap) -> Option<RequestId> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(RequestId::new)
}

/// Span factory used by the trace layer.
#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        // The outer middleware stashes the id in extensions before this runs
        let request_id = match request.extensions().get::<RequestId>() {
            Some(rid) => rid.clone(),
            None => header_request_id(request.headers()).unwrap_or_default(),
        };

        tracing::info_span!(
            "http.request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

fn record_request_metrics(elapsed: std::time::Duration, status: StatusCode) {
    crate::metrics::increment_counter("http_requests_total");
    crate::metrics::observe_histogram("http_request_duration_seconds", elapsed.as_secs_f64());
    if status.is_server_error() {
        crate::metrics::increment_counter("http_errors_total");
    }
}

/// Assigns every request an id, propagating one supplied by the caller.
/// Handlers read it from the request extensions, error responses from the
/// task-local scope, and callers from the echoed response header.
pub async fn request_id_middleware(mut request: axum::extract::Request, next: Next) -> Response {
    let request_id = header_request_id(request.headers()).unwrap_or_default();

    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let started = std::time::Instant::now();
    let scoped = scope_request_id(request_id.clone(), async move { next.run(request).await });
    let mut response = tracing::Instrument::instrument(scoped, span).await;

    record_request_metrics(started.elapsed(), response.status());

    // Ids are UUIDs or caller strings that already passed header parsing
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

/// Trace layer marking 5xx responses as failures.
pub fn configure_http_tracing(
) -> TraceLayer<SharedClassifier<StatusInRangeAsFailures>, RequestSpanMaker> {
    let failures = StatusInRangeAsFailures::new(500..=599);
    TraceLayer::new(SharedClassifier::new(failures)).make_span_with(RequestSpanMaker)
}
