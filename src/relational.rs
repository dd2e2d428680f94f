use crate::error::{BackendError, PersistError};
use crate::record::StructuredRecord;
use crate::sink::Sink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Typed row for the `logs` table.
///
/// Columns: `id` (primary key), `level` (indexed), `timestamp`
/// (timezone-aware), `message`, `name`, `module` (indexed), `function`,
/// `lineno`. Backends may add server-assigned columns such as an insertion
/// time; those are not part of the row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub id: Uuid,
    pub level: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub name: String,
    pub module: String,
    pub function: String,
    pub lineno: i64,
}

impl From<&StructuredRecord> for LogRow {
    fn from(record: &StructuredRecord) -> Self {
        LogRow {
            id: record.id,
            level: record.level.clone(),
            timestamp: record.created,
            message: record.message.clone(),
            name: record.name.clone(),
            module: record.module.clone(),
            function: record.function.clone(),
            lineno: i64::from(record.line),
        }
    }
}

impl fmt::Display for LogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] ({}:{}) {}",
            self.level, self.timestamp, self.name, self.module, self.message
        )
    }
}

/// Connection pool or engine that hands out transactional sessions.
///
/// The handle is shared by all emitters; each `persist` opens its own
/// session so concurrent writes never share a transaction.
#[async_trait]
pub trait RelationalBackend: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn Session>, BackendError>;
}

/// One unit of work against the database.
#[async_trait]
pub trait Session: Send {
    async fn add(&mut self, row: &LogRow) -> Result<(), BackendError>;
    async fn commit(&mut self) -> Result<(), BackendError>;
    async fn rollback(&mut self) -> Result<(), BackendError>;
    /// Release the session. Called exactly once per opened session.
    async fn close(&mut self) -> Result<(), BackendError>;
}

/// [`Sink`] writing each record inside its own transaction.
///
/// Happy path: open, add, commit, close. If add or commit fails the
/// transaction is rolled back, the session is closed and the add/commit
/// error is returned. Rollback and close failures are written to stderr and
/// never replace that error.
///
/// Rollback and close both happen before `persist` returns, so a
/// [`SinkHandler`](crate::handler::SinkHandler) reports the failure to its
/// hook only after the session is already closed: rollback, close, report.
#[derive(Clone)]
pub struct RelationalSink {
    backend: Arc<dyn RelationalBackend>,
}

impl RelationalSink {
    pub fn new(backend: Arc<dyn RelationalBackend>) -> Self {
        RelationalSink { backend }
    }
}

#[async_trait]
impl Sink for RelationalSink {
    async fn persist(&self, record: &StructuredRecord) -> Result<(), PersistError> {
        let row = LogRow::from(record);
        let mut session = self
            .backend
            .open_session()
            .await
            .map_err(PersistError::Open)?;

        let result = match session.add(&row).await {
            Ok(()) => session.commit().await.map_err(PersistError::Commit),
            Err(e) => Err(PersistError::Add(e)),
        };

        if result.is_err() {
            if let Err(e) = session.rollback().await {
                eprintln!("log session rollback failed for record {}: {}", row.id, e);
            }
        }

        if let Err(e) = session.close().await {
            eprintln!("log session close failed for record {}: {}", row.id, e);
        }

        result
    }
}
