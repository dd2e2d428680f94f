use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized record produced by a [`Formatter`](crate::formatter::Formatter)
/// and handed to a [`Sink`](crate::sink::Sink).
///
/// Serializes to the document layout used by the document-store backend:
/// `id, levelname, timestamp, message, name, module, function, lineno`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub id: Uuid,
    #[serde(rename = "levelname")]
    pub level: String,
    /// Textual timestamp (RFC 3339 unless the formatter was given a `datefmt`).
    pub timestamp: String,
    /// The same instant as a timezone-aware value, for typed backends.
    #[serde(skip, default = "Utc::now")]
    pub created: DateTime<Utc>,
    pub message: String,
    pub name: String,
    pub module: String,
    pub function: String,
    #[serde(rename = "lineno")]
    pub line: u32,
}
