use crate::error::PersistError;
use crate::record::StructuredRecord;
use async_trait::async_trait;

/// Destination that durably stores [`StructuredRecord`]s.
///
/// Implementations wrap a concrete backend (MongoDB collection, SQL table,
/// ...). They report failures as values and leave recovery to the caller,
/// normally a [`SinkHandler`](crate::handler::SinkHandler).
#[async_trait]
pub trait Sink: Send + Sync {
    /// Persist a single record.
    ///
    /// **Returns**
    /// - `Ok(())` once the backend acknowledged the write.
    /// - `Err(..)` naming the step that failed. Any transaction opened by
    ///   the sink must already be rolled back and released when this
    ///   returns.
    async fn persist(&self, record: &StructuredRecord) -> Result<(), PersistError>;
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for std::sync::Arc<S> {
    async fn persist(&self, record: &StructuredRecord) -> Result<(), PersistError> {
        (**self).persist(record).await
    }
}
