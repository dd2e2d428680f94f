pub mod level;
pub mod event;
pub mod record;
pub mod formatter;
pub mod error;
pub mod sink;
pub mod hook;
pub mod handler;
pub mod document;
pub mod relational;
pub mod memory;
pub mod logger;
pub mod layer;
mod percent;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mongodb")]
pub mod mongo;

pub mod backend;
pub mod env;
pub mod init;

pub use error::PersistError;
pub use event::LogEvent;
pub use formatter::{Formatter, RecordFormatter};
pub use handler::{Handler, SinkHandler};
pub use hook::{ErrorHook, StderrHook};
pub use level::Level;
pub use logger::Logger;
pub use record::StructuredRecord;
pub use sink::Sink;
