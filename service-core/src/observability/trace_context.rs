//! W3C trace context propagation for calls between the gateway and the entry service.
//!
//! See: https://www.w3.org/TR/trace-context/

use http::HeaderMap;
use opentelemetry::trace::TraceContextExt;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Writes the current span's context as `traceparent`/`tracestate`.
/// Does nothing when no exporter is installed and the span context is invalid.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // version-trace_id-span_id-trace_flags
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }

        let tracestate = span_context.trace_state().header();
        if !tracestate.is_empty()
            && let Ok(value) = tracestate.parse()
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// Carries trace context from an inbound request to an outbound one.
///
/// The caller's own `traceparent` wins so a trace started in the browser or an
/// upstream proxy stays intact; otherwise the current span is injected.
pub fn inject_trace_headers(incoming: &HeaderMap, outgoing: &mut HeaderMap) {
    match incoming.get(TRACEPARENT_HEADER) {
        Some(traceparent) => {
            outgoing.insert(TRACEPARENT_HEADER, traceparent.clone());
            if let Some(tracestate) = incoming.get(TRACESTATE_HEADER) {
                outgoing.insert(TRACESTATE_HEADER, tracestate.clone());
            }
        }
        None => inject_trace_context(outgoing),
    }

    if let Some(request_id) = incoming.get(REQUEST_ID_HEADER) {
        outgoing.insert(REQUEST_ID_HEADER, request_id.clone());
    }
}
