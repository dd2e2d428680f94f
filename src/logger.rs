use crate::event::LogEvent;
use crate::handler::Handler;
use crate::level::Level;
use std::sync::Arc;

/// Named log source bound to one [`Handler`].
///
/// Loggers are plain values passed to the code that needs them; cloning is
/// cheap and shares the handler. Use [`log_event!`](crate::log_event) to
/// capture the call-site module, function and line.
#[derive(Clone)]
pub struct Logger {
    name: String,
    handler: Arc<dyn Handler>,
}

impl Logger {
    pub fn new(name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Logger {
            name: name.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Start an event carrying this logger's name.
    pub fn event(&self, level: Level, msg: impl Into<String>) -> LogEvent {
        LogEvent::new(level, self.name.clone(), msg)
    }

    /// Hand a prepared event to the handler and wait until it is persisted
    /// (or reported).
    pub async fn log(&self, event: LogEvent) {
        self.handler.emit(&event).await;
    }

    pub async fn debug(&self, msg: impl Into<String>) {
        self.log(self.event(Level::Debug, msg)).await
    }

    pub async fn info(&self, msg: impl Into<String>) {
        self.log(self.event(Level::Info, msg)).await
    }

    pub async fn warning(&self, msg: impl Into<String>) {
        self.log(self.event(Level::Warning, msg)).await
    }

    pub async fn error(&self, msg: impl Into<String>) {
        self.log(self.event(Level::Error, msg)).await
    }

    pub async fn critical(&self, msg: impl Into<String>) {
        self.log(self.event(Level::Critical, msg)).await
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.rsplit("::")
            .find(|part| *part != "{{closure}}")
            .unwrap_or(name)
    }};
}

/// Build an event at the call site and log it through a [`Logger`].
///
/// Evaluates to a future; `.await` it.
///
/// ```ignore
/// log_event!(logger, Level::Info, "user %s logged in", "alice").await;
/// ```
#[macro_export]
macro_rules! log_event {
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        let args: ::std::vec::Vec<::std::string::String> =
            ::std::vec![$(::std::string::ToString::to_string(&$arg)),*];
        let event = $logger
            .event($level, $msg)
            .with_args(args)
            .with_location(::std::module_path!(), $crate::__function_name!(), ::std::line!());
        $logger.log(event)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::SinkHandler;
    use crate::memory::MemoryRelationalBackend;
    use crate::relational::RelationalSink;

    fn logger(backend: &MemoryRelationalBackend, level: Level) -> Logger {
        let handler =
            SinkHandler::new(RelationalSink::new(Arc::new(backend.clone()))).with_level(level);
        Logger::new("myLogger", Arc::new(handler))
    }

    #[test]
    fn function_name_is_the_enclosing_fn() {
        fn lookup_user() -> &'static str {
            crate::__function_name!()
        }
        assert_eq!(lookup_user(), "lookup_user");
    }

    #[tokio::test]
    async fn macro_captures_call_site() {
        let backend = MemoryRelationalBackend::new();
        let logger = logger(&backend, Level::Debug);

        let line = line!() + 1;
        crate::log_event!(logger, Level::Warning, "disk at %d%%", 93).await;

        let rows = backend.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "disk at 93%");
        assert_eq!(rows[0].name, "myLogger");
        assert_eq!(rows[0].module, module_path!());
        assert_eq!(rows[0].lineno, i64::from(line));
    }

    #[tokio::test]
    async fn convenience_methods_respect_threshold() {
        let backend = MemoryRelationalBackend::new();
        let logger = logger(&backend, Level::Info);

        logger.debug("noise").await;
        logger.info("INFO message").await;
        logger.warning("WARNING message").await;
        logger.error("ERROR message").await;

        let levels: Vec<_> = backend.rows().into_iter().map(|r| r.level).collect();
        assert_eq!(levels, ["INFO", "WARNING", "ERROR"]);
    }
}
