use crate::error::{BackendError, PersistError};
use crate::record::StructuredRecord;
use crate::sink::Sink;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Database used by [`DocumentSink`] unless overridden.
pub const DEFAULT_DATABASE: &str = "Logs";

/// Connected document-store client able to insert one document into a
/// named database/collection pair.
///
/// Documents arrive already encoded as a JSON object keyed by the record's
/// field names (`id`, `levelname`, `timestamp`, ...).
///
/// Implemented for `mongodb::Client` behind the `mongodb` feature, and by
/// [`MemoryDocumentClient`](crate::memory::MemoryDocumentClient) for tests.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: &Map<String, Value>,
    ) -> Result<(), BackendError>;
}

/// Encode a value as a document.
///
/// Fails with [`PersistError::Encode`] when serialization fails or the value
/// does not serialize to an object.
pub fn encode_document<T>(value: &T) -> Result<Map<String, Value>, PersistError>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(PersistError::Encode(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(PersistError::Encode(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// [`Sink`] writing each record as one document.
///
/// The client handle is shared; every `persist` call encodes the record and
/// performs exactly one insert. Encoding failures come back as
/// [`PersistError::Encode`] and insert failures as [`PersistError::Insert`],
/// so the owning handler can report them instead of propagating.
#[derive(Clone)]
pub struct DocumentSink {
    client: Arc<dyn DocumentClient>,
    database: String,
    collection: String,
}

impl DocumentSink {
    /// Target `collection` inside the default `"Logs"` database.
    pub fn new(client: Arc<dyn DocumentClient>, collection: impl Into<String>) -> Self {
        DocumentSink {
            client,
            database: DEFAULT_DATABASE.to_string(),
            collection: collection.into(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl Sink for DocumentSink {
    async fn persist(&self, record: &StructuredRecord) -> Result<(), PersistError> {
        let document = encode_document(record)?;
        self.client
            .insert_one(&self.database, &self.collection, &document)
            .await
            .map_err(PersistError::Insert)
    }
}
