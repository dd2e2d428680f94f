use crate::error::PersistError;
use crate::event::LogEvent;
use crate::formatter::{Formatter, RecordFormatter};
use crate::hook::{ErrorHook, StderrHook};
use crate::level::Level;
use crate::record::StructuredRecord;
use crate::sink::Sink;
use async_trait::async_trait;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Receiver of [`LogEvent`]s with a mutable severity threshold.
///
/// A [`Logger`](crate::logger::Logger) or the tracing
/// [`SinkLayer`](crate::layer::SinkLayer) holds handlers explicitly; there is
/// no process-wide registry.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Current minimum severity.
    fn level(&self) -> Level;

    /// Change the minimum severity. Takes effect for the next `emit`.
    fn set_level(&self, level: Level);

    fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Filter, format and persist one event. Never fails from the caller's
    /// point of view.
    async fn emit(&self, event: &LogEvent);
}

/// Dispatcher composing a [`Formatter`], a [`Sink`] and an [`ErrorHook`].
///
/// Per call: events below the threshold are dropped before any work is
/// done; otherwise the event is formatted, persisted once, and a failure is
/// handed to the hook exactly once with the formatted record.
pub struct SinkHandler<F = RecordFormatter, S = Arc<dyn Sink>> {
    formatter: F,
    sink: S,
    hook: Arc<dyn ErrorHook>,
    level: AtomicU8,
}

impl<S: Sink> SinkHandler<RecordFormatter, S> {
    /// Handler with the default formatter, stderr hook and a threshold that
    /// accepts every level.
    pub fn new(sink: S) -> Self {
        SinkHandler {
            formatter: RecordFormatter::new(),
            sink,
            hook: Arc::new(StderrHook),
            level: AtomicU8::new(Level::Debug as u8),
        }
    }
}

impl<F: Formatter, S: Sink> SinkHandler<F, S> {
    pub fn with_formatter<G: Formatter>(self, formatter: G) -> SinkHandler<G, S> {
        SinkHandler {
            formatter,
            sink: self.sink,
            hook: self.hook,
            level: self.level,
        }
    }

    pub fn with_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    pub fn with_level(self, level: Level) -> Self {
        self.level.store(level as u8, Ordering::Relaxed);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn report(&self, record: &StructuredRecord, error: &PersistError) {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.hook.handle_error(record, error)));
        if outcome.is_err() {
            eprintln!("log error hook panicked while reporting record {}", record.id);
        }
    }
}

#[async_trait]
impl<F: Formatter, S: Sink> Handler for SinkHandler<F, S> {
    fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    async fn emit(&self, event: &LogEvent) {
        if !self.enabled(event.level) {
            return;
        }

        let record = self.formatter.format(event);
        if let Err(e) = self.sink.persist(&record).await {
            self.report(&record, &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Sink for CountingSink {
        async fn persist(&self, _record: &StructuredRecord) -> Result<(), PersistError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PersistError::Insert("connection reset".into()))
            } else {
                Ok(())
            }
        }
    }

    fn event(level: Level) -> LogEvent {
        LogEvent::new(level, "test", "hello")
    }

    #[tokio::test]
    async fn below_threshold_skips_persistence() {
        let handler = SinkHandler::new(CountingSink::default()).with_level(Level::Info);
        handler.emit(&event(Level::Debug)).await;
        assert_eq!(handler.sink().calls.load(Ordering::SeqCst), 0);

        handler.emit(&event(Level::Info)).await;
        assert_eq!(handler.sink().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn threshold_can_change_between_calls() {
        let handler = SinkHandler::new(CountingSink::default());
        assert_eq!(handler.level(), Level::Debug);

        handler.set_level(Level::Error);
        handler.emit(&event(Level::Warning)).await;
        assert_eq!(handler.sink().calls.load(Ordering::SeqCst), 0);

        handler.set_level(Level::Warning);
        handler.emit(&event(Level::Warning)).await;
        assert_eq!(handler.sink().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_reported_once_with_formatted_record() {
        let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
        let seen_hook = Arc::clone(&seen);
        let sink = CountingSink {
            fail: true,
            ..Default::default()
        };
        let handler =
            SinkHandler::new(sink).with_hook(move |record: &StructuredRecord, err: &PersistError| {
                seen_hook
                    .lock()
                    .unwrap()
                    .push((record.message.clone(), err.to_string()));
            });

        handler
            .emit(&LogEvent::new(Level::Error, "test", "disk %s full").with_args(["/var"]))
            .await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "disk /var full");
        assert!(seen[0].1.contains("connection reset"));
    }

    #[tokio::test]
    async fn panicking_hook_does_not_reach_caller() {
        let sink = CountingSink {
            fail: true,
            ..Default::default()
        };
        let handler = SinkHandler::new(sink)
            .with_hook(|_: &StructuredRecord, _: &PersistError| panic!("hook exploded"));

        handler.emit(&event(Level::Critical)).await;
        assert_eq!(handler.sink().calls.load(Ordering::SeqCst), 1);
    }
}
