use crate::event::LogEvent;
use crate::handler::Handler;
use crate::level::Level;
use chrono::Utc;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets whose events are never forwarded, so database drivers logging
/// about our own inserts cannot feed back into the sink.
pub const IGNORED_TARGETS: [&str; 2] = ["sqlx", "mongodb"];

/// `tracing_subscriber` layer that turns events into [`LogEvent`]s and
/// forwards them to a [`Handler`] via a bounded channel and background task.
///
/// The handler's threshold is checked on the emitting thread, so filtered
/// events cost nothing beyond the check. Accepted events are queued with
/// `try_send`; when the queue is full the event is dropped and counted.
/// The background task awaits `emit` for one event at a time, in arrival
/// order.
pub struct SinkLayer {
    sender: mpsc::Sender<LogEvent>,
    handler: Arc<dyn Handler>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Below the handler threshold or from an ignored target.
    pub filtered_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl SinkLayer {
    /// Create a new layer and spawn the task draining its channel into
    /// `handler`. Must be called inside a Tokio runtime.
    ///
    /// `buffer` is raised to at least 16. The returned task ends once the
    /// layer (and with it the sender) is dropped and the queue is drained.
    pub fn new(handler: Arc<dyn Handler>, buffer: usize) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let (tx, mut rx) = mpsc::channel::<LogEvent>(buffer);

        let worker = Arc::clone(&handler);
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                worker.emit(&event).await;
            }
        });

        (Self {
            sender: tx,
            handler,
            total_events: Arc::new(AtomicU64::new(0)),
            filtered_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }, handle)
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        let ignored = IGNORED_TARGETS
            .iter()
            .any(|t| meta.target() == *t || meta.target().starts_with(&format!("{t}::")));
        let base_level = Level::from(*meta.level());
        if ignored || !self.handler.enabled(base_level) {
            self.filtered_events.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let level = if base_level == Level::Error && visitor.critical {
            Level::Critical
        } else {
            base_level
        };

        let function = ctx
            .event_span(event)
            .map(|span| span.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let log_event = LogEvent {
            level,
            msg: visitor.into_message(),
            args: Vec::new(),
            name: meta.target().to_string(),
            module: meta.module_path().unwrap_or(meta.target()).to_string(),
            function,
            line: meta.line().unwrap_or(0),
            created: Utc::now(),
        };

        match self.sender.try_send(log_event) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log channel full, dropping log event");
            }
        }
    }
}

/// Collects the `message` field and renders the rest as `key=value`.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
    critical: bool,
}

impl FieldVisitor {
    fn into_message(self) -> String {
        let mut out = self.message.unwrap_or_default();
        for (key, value) in self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{key}={value}");
        }
        out
    }

    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "critical" {
            self.critical = value;
        } else {
            self.push(field, value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::SinkHandler;
    use crate::memory::MemoryRelationalBackend;
    use crate::relational::RelationalSink;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[tokio::test]
    async fn forwards_events_above_threshold() {
        let backend = MemoryRelationalBackend::new();
        let handler = SinkHandler::new(RelationalSink::new(Arc::new(backend.clone())))
            .with_level(Level::Info);
        let (layer, worker) = SinkLayer::new(Arc::new(handler), 64);
        let total = Arc::clone(&layer.total_events);
        let filtered = Arc::clone(&layer.filtered_events);

        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("ignored");
            tracing::info!(user = "alice", "user logged in");
            tracing::info_span!("checkout").in_scope(|| {
                tracing::error!(critical = true, order_id = 7, "payment gateway down");
            });
            tracing::warn!(target: "sqlx::query", "driver chatter");
        });
        worker.await.unwrap();

        assert_eq!(total.load(Ordering::Relaxed), 4);
        assert_eq!(filtered.load(Ordering::Relaxed), 2);

        let rows = backend.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].level, "INFO");
        assert_eq!(rows[0].message, "user logged in user=alice");
        assert_eq!(rows[0].function, "unknown");
        assert_eq!(rows[1].level, "CRITICAL");
        assert_eq!(rows[1].message, "payment gateway down order_id=7");
        assert_eq!(rows[1].function, "checkout");
        assert_eq!(rows[1].module, module_path!());
    }
}
