//! `tracing` integration.
//!
//! [`LoggerLayer`] feeds `tracing` events through a logger's level gate,
//! sampler, encoder and sinks, so code instrumented with `tracing::info!`
//! and friends ends up in the same dated file as direct logger calls.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::entry::Level;
use super::logger::Core;

/// Key holding the names of the spans enclosing an event
pub const SPAN_KEY: &str = "span";

/// A tracing Layer that writes events through a logger.
///
/// Obtain one from [`Logger::layer`](super::Logger::layer).
pub struct LoggerLayer {
    core: Arc<Core>,
}

impl LoggerLayer {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self { core }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // spans are always let through so events inside them keep their scope
        if metadata.is_span() {
            return true;
        }
        Level::from_tracing(*metadata.level()).is_some_and(|level| self.core.enabled(level))
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(level) = Level::from_tracing(*metadata.level()) else {
            return;
        };

        let mut recorded = EventFields::default();
        event.record(&mut recorded);

        let mut fields = recorded.fields;
        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<&str> = scope.from_root().map(|span| span.name()).collect();
            if !spans.is_empty() {
                fields.insert(SPAN_KEY.into(), Value::String(spans.join(" > ")));
            }
        }

        let caller = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        };

        let message = recorded.message.unwrap_or_default();
        self.core.emit(level, message, caller, fields);
    }
}

/// Collects an event's message and fields as JSON values.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl EventFields {
    fn put(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(text)) => self.message = Some(text),
            ("message", other) => self.message = Some(other.to_string()),
            (name, value) => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}
