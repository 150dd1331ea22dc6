//! Tests for the warnings deep merge emits when an overlay drops sibling keys.
//!
//! Messages are captured with a minimal `tracing` subscriber installed for the
//! duration of one closure, so these tests do not depend on a global subscriber.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use strata_config::{Map, Value, merge, merge_into};

#[derive(Clone)]
struct CapturingSubscriber {
    events: Arc<Mutex<Vec<(tracing::Level, String)>>>,
    next_id: Arc<AtomicU64>,
}

impl CapturingSubscriber {
    fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().expect("lock poisoned"))
            .into_iter()
            .filter(|(level, _)| *level == tracing::Level::WARN)
            .map(|(_, message)| message)
            .collect()
    }
}

struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

impl tracing::Subscriber for CapturingSubscriber {
    fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _attrs: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn record(&self, _span: &tracing::span::Id, _values: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _span: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, event: &tracing::Event<'_>) {
        let mut visitor = MessageVisitor { message: None };
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.events
                .lock()
                .expect("lock poisoned")
                .push((*event.metadata().level(), message));
        }
    }

    fn enter(&self, _span: &tracing::span::Id) {}

    fn exit(&self, _span: &tracing::span::Id) {}

    fn register_callsite(
        &self,
        _metadata: &'static tracing::Metadata<'static>,
    ) -> tracing::subscriber::Interest {
        tracing::subscriber::Interest::sometimes()
    }
}

fn capture_warnings<F: FnOnce()>(f: F) -> Vec<String> {
    let subscriber = CapturingSubscriber {
        events: Arc::new(Mutex::new(Vec::new())),
        next_id: Arc::new(AtomicU64::new(1)),
    };
    let dispatch = tracing::Dispatch::new(subscriber.clone());
    tracing::dispatcher::with_default(&dispatch, f);
    subscriber.take_warnings()
}

fn map(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_partial_override_warns_naming_dropped_key() {
    let base = map(&[("a", Value::Integer(1)), ("b", Value::Integer(2))]);
    let overlay = map(&[("a", Value::Integer(9))]);

    let mut merged = Map::new();
    let warnings = capture_warnings(|| merged = merge(&base, &overlay, false));

    assert_eq!(
        merged,
        map(&[("a", Value::Integer(9)), ("b", Value::Integer(2))])
    );
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("b"), "{}", warnings[0]);
    assert!(warnings[0].contains("partially overridden"), "{}", warnings[0]);
}

#[test]
fn test_one_warning_per_level() {
    let base = map(&[
        ("keep", Value::Integer(1)),
        (
            "server",
            Value::Map(map(&[
                ("host", Value::from("localhost")),
                ("port", Value::Integer(8080)),
            ])),
        ),
    ]);
    let overlay = map(&[(
        "server",
        Value::Map(map(&[("port", Value::Integer(9090))])),
    )]);

    let warnings = capture_warnings(|| {
        merge(&base, &overlay, false);
    });

    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings.iter().any(|w| w.contains("keep")));
    assert!(warnings.iter().any(|w| w.contains("server") && w.contains("host")));
}

#[test]
fn test_suppressed_merge_is_silent() {
    let base = map(&[("a", Value::Integer(1)), ("b", Value::Integer(2))]);
    let overlay = map(&[("a", Value::Integer(9))]);

    let warnings = capture_warnings(|| {
        merge(&base, &overlay, true);
    });
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn test_empty_overlay_is_silent_noop() {
    let mut base = map(&[("a", Value::Integer(1))]);
    let before = base.clone();

    let warnings = capture_warnings(|| merge_into(&mut base, &Map::new(), "", false));
    assert!(warnings.is_empty());
    assert_eq!(base, before);
}

#[test]
fn test_lists_are_replaced() {
    let base = map(&[(
        "x",
        Value::List(vec![Value::Integer(1), Value::Integer(2)]),
    )]);
    let overlay = map(&[("x", Value::List(vec![Value::Integer(3)]))]);

    let warnings = capture_warnings(|| {
        assert_eq!(merge(&base, &overlay, false), overlay);
    });
    assert!(warnings.is_empty());
}
