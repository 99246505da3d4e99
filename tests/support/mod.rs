//! Shared test helpers: a span-recording subscriber layer and request builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use gatehouse::middleware::{Decorators, TRACING_COMPONENT, Tracer};
use gatehouse::Request;
use http::Method;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// One request span as the subscriber saw it.
#[derive(Clone, Debug)]
pub struct RecordedSpan {
    pub id: u64,
    pub parent: Option<u64>,
    pub fields: HashMap<String, String>,
}

#[derive(Default)]
struct Recorded {
    spans: Vec<RecordedSpan>,
    closed: usize,
    events: Vec<Option<String>>,
}

/// Layer that records request spans (target [`TRACING_COMPONENT`]) and the
/// span each event was emitted in.
#[derive(Clone, Default)]
pub struct SpanRecorder {
    inner: Arc<Mutex<Recorded>>,
}

impl SpanRecorder {
    /// A recorder plus decorators whose tracer reports to it.
    pub fn decorators() -> (Self, Decorators) {
        let recorder = Self::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        (recorder, Decorators::new(Tracer::new(subscriber)))
    }

    pub fn opened(&self) -> usize {
        self.inner.lock().unwrap().spans.len()
    }

    pub fn closed(&self) -> usize {
        self.inner.lock().unwrap().closed
    }

    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.inner.lock().unwrap().spans.clone()
    }

    /// For every event, the `otel.name` of the request span it was inside.
    pub fn event_spans(&self) -> Vec<Option<String>> {
        self.inner.lock().unwrap().events.clone()
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_owned(), value.to_string());
    }
}

impl<S> Layer<S> for SpanRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        if attrs.metadata().target() != TRACING_COMPONENT {
            return;
        }
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        self.inner.lock().unwrap().spans.push(RecordedSpan {
            id: id.into_u64(),
            parent: attrs.parent().map(Id::into_u64),
            fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let name = ctx.event_span(event).and_then(|span| {
            let id = span.id().into_u64();
            let recorded = self.inner.lock().unwrap();
            let name = recorded
                .spans
                .iter()
                .rfind(|s| s.id == id)
                .and_then(|s| s.fields.get("otel.name").cloned());
            name
        });
        self.inner.lock().unwrap().events.push(name);
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let is_request_span = ctx
            .span(&id)
            .is_some_and(|span| span.metadata().target() == TRACING_COMPONENT);
        if is_request_span {
            self.inner.lock().unwrap().closed += 1;
        }
    }
}

pub fn request(method: Method, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
        .into()
}
