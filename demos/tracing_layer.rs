use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, info_span, warn};

use tracing_db_sink::backend::{make_sink_from_config, BackendConfig};
use tracing_db_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_db_sink::SinkHandler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // LOG_SINK_DSN selects the backend, LOG_SINK_LEVEL the threshold.
    let sink = make_sink_from_config(&BackendConfig::from_env()?).await?;
    let handler = Arc::new(SinkHandler::new(sink));
    init_tracing_with_config(handler, LayerConfig::from_env())?;

    info!("starting service");
    info_span!("login").in_scope(|| {
        warn!(user = "alice", "password about to expire");
    });
    error!(critical = true, order_id = 123, "order failed");

    // Give the background task time to write the records.
    sleep(Duration::from_secs(1)).await;
    Ok(())
}
