use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

pub type LogRing = Arc<Mutex<VecDeque<String>>>;

pub fn new_ring() -> LogRing {
    Arc::new(Mutex::new(VecDeque::new()))
}

/// Mirrors every event as a JSON line into a bounded ring and a broadcast
/// channel, for `/api/logs` and `/api/logs/stream`.
pub struct BroadcastLayer {
    pub tx: broadcast::Sender<String>,
    pub ring: LogRing,
    pub capacity: usize,
}

impl BroadcastLayer {
    pub fn new(tx: broadcast::Sender<String>, ring: LogRing, capacity: usize) -> Self {
        Self { tx, ring, capacity: capacity.max(1) }
    }
}

struct JsonVisitor<'a> {
    message: &'a mut String,
    fields: &'a mut Map<String, Value>,
}

impl tracing::field::Visit for JsonVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let mut text = format!("{value:?}");
        // Strip surrounding quotes added by Debug on &str
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            text = text[1..text.len() - 1].to_string();
        }
        if field.name() == "message" {
            *self.message = text;
        } else {
            self.fields.insert(field.name().to_string(), Value::from(text));
        }
    }
}

fn category(target: &str) -> &'static str {
    if target.starts_with("intake_agent") {
        "model"
    } else if target.starts_with("intake_domains") || target.starts_with("intake_core") {
        "analysis"
    } else if target.starts_with("tower_http") {
        "http"
    } else {
        "system"
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for BroadcastLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => "err",
            tracing::Level::WARN => "warn",
            tracing::Level::INFO => "info",
            tracing::Level::DEBUG => "debug",
            tracing::Level::TRACE => return,
        };

        let mut message = String::new();
        let mut fields = Map::new();
        event.record(&mut JsonVisitor {
            message: &mut message,
            fields: &mut fields,
        });

        let json = serde_json::json!({
            "ts": Utc::now().to_rfc3339(),
            "level": level,
            "message": message,
            "category": category(event.metadata().target()),
            "fields": fields,
        })
        .to_string();

        let _ = self.tx.send(json.clone());
        if let Ok(mut ring) = self.ring.lock() {
            ring.push_back(json);
            while ring.len() > self.capacity {
                ring.pop_front();
            }
        }
    }
}
