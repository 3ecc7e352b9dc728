//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract trace context from incoming requests
//! - Propagate trace context to outbound requests
//! - Create spans for handler and client operations
//!
//! # Design Decisions
//! - Supports W3C Trace Context and W3C Baggage headers
//! - Handlers depend on [`TraceCarrier`], never on a concrete propagator
//! - The tracer provider lives inside [`Telemetry`] and is released by
//!   [`Telemetry::shutdown`] at process end

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use futures_util::future::BoxFuture;
use opentelemetry::propagation::{
    Extractor, Injector, TextMapCompositePropagator, TextMapPropagator,
};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::Context;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use std::sync::Arc;

/// Moves trace context in and out of HTTP headers.
pub trait TraceCarrier: Send + Sync {
    /// Read the caller's trace context. Missing or invalid headers yield an
    /// empty context, so the next span starts a new trace.
    fn extract(&self, headers: &HeaderMap) -> Context;

    /// Write `cx` into outbound request headers.
    fn inject(&self, cx: &Context, headers: &mut HeaderMap);
}

/// `traceparent`/`tracestate` plus `baggage` headers.
pub struct W3cTraceCarrier {
    propagator: TextMapCompositePropagator,
}

impl W3cTraceCarrier {
    pub fn new() -> Self {
        Self {
            propagator: TextMapCompositePropagator::new(vec![
                Box::new(TraceContextPropagator::new()),
                Box::new(BaggagePropagator::new()),
            ]),
        }
    }
}

impl Default for W3cTraceCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceCarrier for W3cTraceCarrier {
    fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator
            .extract_with_context(&Context::new(), &HeaderExtractor(headers))
    }

    fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator
            .inject_context(cx, &mut HeaderInjector(headers));
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                self.0.insert(name, value);
            }
            _ => tracing::warn!(header = %key, "Dropping unrepresentable trace header"),
        }
    }
}

/// Tracing context of one service process.
///
/// Built once at startup and shared through `Arc` with every component that
/// opens spans or crosses a process boundary.
pub struct Telemetry {
    service: String,
    provider: TracerProvider,
    tracer: Tracer,
    carrier: Arc<dyn TraceCarrier>,
}

impl Telemetry {
    /// Telemetry whose spans are not exported anywhere.
    ///
    /// Trace and span ids are still generated and propagated.
    pub fn new(service: impl Into<String>) -> Self {
        Self::from_provider(service.into(), TracerProvider::builder().build())
    }

    /// Telemetry that hands every finished span to `exporter`.
    pub fn with_exporter<E>(service: impl Into<String>, exporter: E) -> Self
    where
        E: SpanExporter + 'static,
    {
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter)
            .build();
        Self::from_provider(service.into(), provider)
    }

    fn from_provider(service: String, provider: TracerProvider) -> Self {
        let tracer = provider.tracer(service.clone());
        Self {
            service,
            provider,
            tracer,
            carrier: Arc::new(W3cTraceCarrier::new()),
        }
    }

    /// Replace the header propagation format.
    pub fn with_carrier(mut self, carrier: Arc<dyn TraceCarrier>) -> Self {
        self.carrier = carrier;
        self
    }

    /// Start a span as a child of `parent` and return the context holding it.
    pub fn start_span(&self, name: &'static str, kind: SpanKind, parent: &Context) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.carrier.extract(headers)
    }

    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.carrier.inject(cx, headers);
    }

    /// Flush pending spans and release the tracer provider.
    pub fn shutdown(&self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!(service = %self.service, error = %e, "Tracer provider shutdown failed");
        }
    }
}

/// Mark the span in `cx` as failed and end it.
pub fn end_with_error(cx: &Context, message: &'static str) {
    let span = cx.span();
    span.set_status(Status::error(message));
    span.end();
}

/// Mark the span in `cx` as successful and end it.
pub fn end_ok(cx: &Context) {
    let span = cx.span();
    span.set_status(Status::Ok);
    span.end();
}

/// Span exporter that writes finished spans to the log.
#[derive(Debug, Clone)]
pub struct LogSpanExporter {
    service: String,
}

impl LogSpanExporter {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl SpanExporter for LogSpanExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        for span in batch {
            let duration = span
                .end_time
                .duration_since(span.start_time)
                .unwrap_or_default();
            tracing::info!(
                service = %self.service,
                trace_id = %span.span_context.trace_id(),
                span_id = %span.span_context.span_id(),
                parent_span_id = %span.parent_span_id,
                span_name = %span.name,
                kind = ?span.span_kind,
                status = ?span.status,
                duration_ms = duration.as_millis() as u64,
                "Span finished"
            );
        }
        Box::pin(std::future::ready(Ok(())))
    }
}
