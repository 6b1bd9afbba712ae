#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! Selection edits log at DEBUG with the affected coordinates and the
//! category's new counts; rehydration logs a WARN per unknown saved path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use permtree::{
    CatalogCategory, PermTreeConfig, PermissionCatalog, PermissionPath, PermissionTree,
};
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

/// A tracing Layer that records every event.
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    fn new() -> (Self, Arc<Mutex<Vec<CapturedEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

/// Visitor that extracts event fields.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let (layer, events) = EventCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().unwrap().clone();
    events
}

fn catalog() -> PermissionCatalog {
    PermissionCatalog::new().with_category(
        "Finance",
        CatalogCategory::grouped([("Payroll", ["Run Payroll", "Approve Payroll"])]),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn leaf_toggle_logs_coordinates_and_counts() {
    let events = capture(|| {
        let mut tree = PermissionTree::from_catalog(&catalog(), &PermTreeConfig::default());
        tree.toggle_leaf("Finance", "Payroll", 1).unwrap();
    });

    let toggle = events
        .iter()
        .find(|e| e.message == "toggled permission")
        .expect("toggle event");
    assert_eq!(toggle.level, tracing::Level::DEBUG);
    assert_eq!(toggle.fields["category"], "Finance");
    assert_eq!(toggle.fields["subcategory"], "Payroll");
    assert_eq!(toggle.fields["index"], "1");
    assert_eq!(toggle.fields["selected"], "true");
    assert_eq!(toggle.fields["category_selected"], "1");
    assert_eq!(toggle.fields["category_total"], "2");
}

#[test]
fn bulk_toggles_log_target_value() {
    let events = capture(|| {
        let mut tree = PermissionTree::from_catalog(&catalog(), &PermTreeConfig::default());
        tree.toggle_category("Finance").unwrap();
        tree.toggle_subcategory("Finance", "Payroll").unwrap();
        tree.select_all(true);
    });

    let messages: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::DEBUG)
        .map(|e| e.message.as_str())
        .collect();
    assert!(messages.contains(&"toggled category"));
    assert!(messages.contains(&"toggled sub-category"));
    assert!(messages.contains(&"set selection for whole tree"));

    let sub = events
        .iter()
        .find(|e| e.message == "toggled sub-category")
        .unwrap();
    assert_eq!(sub.fields["selected"], "false");
    assert_eq!(sub.fields["category_selected"], "0");
}

#[test]
fn failed_lookup_logs_nothing() {
    let events = capture(|| {
        let mut tree = PermissionTree::from_catalog(&catalog(), &PermTreeConfig::default());
        assert!(tree.toggle_leaf("Finance", "Payroll", 5).is_err());
    });
    assert!(events.iter().all(|e| e.message != "toggled permission"));
}

#[test]
fn rehydrate_warns_per_unknown_path() {
    let events = capture(|| {
        let saved = [
            PermissionPath::new("Finance", "Payroll", "Run Payroll"),
            PermissionPath::new("Finance", "Payroll", "Void Payroll"),
            PermissionPath::new("Legal", "Contracts", "Sign"),
        ];
        let result = PermissionTree::rehydrate(&catalog(), saved, &PermTreeConfig::default());
        assert_eq!(result.unknown.len(), 2);
    });

    let warnings: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].fields["path"], "Finance/Payroll/Void Payroll");
    assert_eq!(warnings[1].fields["path"], "Legal/Contracts/Sign");
}

#[test]
fn filtering_traces_projection_size() {
    let events = capture(|| {
        let tree = PermissionTree::from_catalog(&catalog(), &PermTreeConfig::default());
        let _ = permtree::filter(&tree, "approve");
    });

    let projected = events
        .iter()
        .find(|e| e.message == "projected permission tree")
        .expect("projection event");
    assert_eq!(projected.level, tracing::Level::TRACE);
    assert_eq!(projected.fields["query"], "approve");
    assert_eq!(projected.fields["permissions"], "1");
}
