//! Custom tracing Layer for dashboard log capture
//!
//! Captures log events and pushes them to DashboardState for display.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::app::{DashboardState, LogEntry};

/// Whether DEBUG logs are shown. Mirrors `DashboardState::show_debug_logs`
/// so the layer can filter without taking the lock.
static SHOW_DEBUG: AtomicBool = AtomicBool::new(false);

/// Logs dropped due to lock contention, synced into the state on the next
/// successful lock.
static DROPPED_LOGS: AtomicU64 = AtomicU64::new(0);

/// Fields appended to the message in the log panel
const SHOWN_FIELDS: [&str; 5] = ["source", "endpoint", "status", "error", "user_id"];

pub fn set_show_debug(enabled: bool) {
    SHOW_DEBUG.store(enabled, Ordering::Relaxed);
}

/// Layer that captures logs for the dashboard log panel.
///
/// `on_event()` must use `try_lock()`: events can fire while the UI loop
/// holds the state lock, and `lock()` would deadlock. Dropped logs under
/// contention are counted.
pub struct TuiLayer {
    state: Arc<Mutex<DashboardState>>,
}

impl TuiLayer {
    pub fn new(state: Arc<Mutex<DashboardState>>) -> Self {
        Self { state }
    }
}

impl<S: Subscriber> Layer<S> for TuiLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();

        if *level == tracing::Level::DEBUG && !SHOW_DEBUG.load(Ordering::Relaxed) {
            return;
        }

        let mut message = String::new();
        let mut extra_fields = Vec::new();
        let mut visitor = MessageVisitor {
            message: &mut message,
            extra_fields: &mut extra_fields,
        };
        event.record(&mut visitor);

        if !extra_fields.is_empty() {
            message.push_str(" [");
            message.push_str(&extra_fields.join(", "));
            message.push(']');
        }

        let entry = LogEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            level: level.to_string(),
            message,
        };

        match self.state.try_lock() {
            Ok(mut state) => {
                let dropped = DROPPED_LOGS.swap(0, Ordering::Relaxed);
                if dropped > 0 {
                    state.dropped_logs_count += dropped;
                }
                state.push_log(entry);
            }
            Err(_) => {
                DROPPED_LOGS.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Extracts the message and selected structured fields
struct MessageVisitor<'a> {
    message: &'a mut String,
    extra_fields: &'a mut Vec<String>,
}

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = format!("{:?}", value).trim_matches('"').to_string();
        } else if SHOWN_FIELDS.contains(&field.name()) {
            self.extra_fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else if SHOWN_FIELDS.contains(&field.name()) {
            self.extra_fields.push(format!("{}={}", field.name(), value));
        }
    }
}
