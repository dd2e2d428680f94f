use crate::level::Level;
use crate::percent;
use chrono::{DateTime, Utc};

/// A single leveled log event as produced by the application.
///
/// The message is kept as an unresolved template plus arguments; call
/// [`LogEvent::message`] to obtain the final text. Events are built once and
/// only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: Level,
    /// Message template, possibly containing printf-style conversions.
    pub msg: String,
    /// Already rendered arguments substituted into `msg` in order.
    pub args: Vec<String>,
    /// Name of the logger that emitted the event.
    pub name: String,
    pub module: String,
    pub function: String,
    pub line: u32,
    /// Capture time of the event.
    pub created: DateTime<Utc>,
}

impl LogEvent {
    /// Create an event stamped with the current time and no source location.
    pub fn new(level: Level, name: impl Into<String>, msg: impl Into<String>) -> Self {
        LogEvent {
            level,
            msg: msg.into(),
            args: Vec::new(),
            name: name.into(),
            module: String::new(),
            function: String::new(),
            line: 0,
            created: Utc::now(),
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        self.args = args.into_iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_location(
        mut self,
        module: impl Into<String>,
        function: impl Into<String>,
        line: u32,
    ) -> Self {
        self.module = module.into();
        self.function = function.into();
        self.line = line;
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Resolve the message template against its arguments.
    ///
    /// Accepts printf-style conversions (`%s`, `%05d`, `%.2f`, `%-10s`,
    /// `%(name)s`, `%*d`, ...); each one consumes the next argument, and
    /// width and precision are applied. `%%` yields a literal percent sign.
    /// With no arguments the template is returned untouched. Conversions left
    /// once the arguments run out are kept verbatim.
    pub fn message(&self) -> String {
        if self.args.is_empty() {
            return self.msg.clone();
        }
        percent::resolve(&self.msg, &self.args)
    }
}
