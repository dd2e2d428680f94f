use crate::error::PersistError;
use crate::record::StructuredRecord;

/// Callback invoked when a record could not be persisted.
///
/// Receives the formatted record (not the raw event) together with the
/// failure. Implementations must not panic; the handler catches panics
/// anyway so the logging call site never sees one.
pub trait ErrorHook: Send + Sync {
    fn handle_error(&self, record: &StructuredRecord, error: &PersistError);
}

impl<F> ErrorHook for F
where
    F: Fn(&StructuredRecord, &PersistError) + Send + Sync,
{
    fn handle_error(&self, record: &StructuredRecord, error: &PersistError) {
        self(record, error)
    }
}

/// Default hook: prints a one-line diagnostic to stderr and drops the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrHook;

impl ErrorHook for StderrHook {
    fn handle_error(&self, record: &StructuredRecord, error: &PersistError) {
        eprintln!(
            "--- logging error --- dropped {} record {} from {}:{} ({}): {}",
            record.level, record.id, record.module, record.line, record.message, error
        );
    }
}
