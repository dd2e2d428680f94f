use std::sync::Arc;

use tracing_db_sink::relational::RelationalSink;
use tracing_db_sink::sqlite::SqliteBackend;
use tracing_db_sink::{log_event, Level, Logger, SinkHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://logs.db".to_string());

    let backend = SqliteBackend::connect(&url).await?;
    backend.create_schema().await?;

    let handler = SinkHandler::new(RelationalSink::new(Arc::new(backend))).with_level(Level::Info);
    let logger = Logger::new("myLogger", Arc::new(handler));

    log_event!(logger, Level::Info, "INFO message").await;
    log_event!(logger, Level::Error, "ERROR message").await;
    log_event!(logger, Level::Warning, "WARNING message").await;
    log_event!(logger, Level::Debug, "DEBUG message is filtered").await;

    Ok(())
}
