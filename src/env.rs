//! Environment variable names used by this crate for convenient
//! configuration of sinks from services.
//!
//! These are purely helpers; the core sink types remain decoupled from
//! environment access.

/// Backend DSN, e.g. `sqlite://logs.db` or `mongodb://localhost:27017`.
pub const LOG_SINK_DSN_ENV: &str = "LOG_SINK_DSN";

/// MongoDB database name (default `Logs`).
pub const LOG_SINK_MONGODB_DATABASE_ENV: &str = "LOG_SINK_MONGODB_DATABASE";

/// MongoDB collection name (default `events`).
pub const LOG_SINK_MONGODB_COLLECTION_ENV: &str = "LOG_SINK_MONGODB_COLLECTION";

/// Minimum level persisted, e.g. `INFO`.
pub const LOG_SINK_LEVEL_ENV: &str = "LOG_SINK_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
