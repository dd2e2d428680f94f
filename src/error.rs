/// Boxed error returned by database drivers.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while persisting a [`StructuredRecord`](crate::record::StructuredRecord).
///
/// Each variant names the step that failed. These never reach the code
/// that emitted the log event; [`SinkHandler`](crate::handler::SinkHandler)
/// routes them to an [`ErrorHook`](crate::hook::ErrorHook).
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("failed to open session: {0}")]
    Open(#[source] BackendError),

    #[error("failed to add row: {0}")]
    Add(#[source] BackendError),

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] BackendError),

    #[error("failed to insert document: {0}")]
    Insert(#[source] BackendError),

    #[error("failed to encode record: {0}")]
    Encode(String),
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,
}

/// Error type returned when building a backend sink from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BackendBuildError {
    #[error("{0} feature is not enabled")]
    FeatureDisabled(&'static str),

    #[error("failed to connect backend: {0}")]
    Connect(#[source] BackendError),
}
