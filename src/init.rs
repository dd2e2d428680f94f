use crate::env::{env_or, LOG_SINK_LEVEL_ENV};
use crate::handler::Handler;
use crate::layer::SinkLayer;
use crate::level::Level;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Layer configuration.
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued [`LogEvent`](crate::event::LogEvent)s
///   before new ones are dropped.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is added
///   next to the [`SinkLayer`] so events are also printed to the console.
/// - `level`: when set, applied to the handler before the layer is
///   installed.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub enable_stdout: bool,
    pub level: Option<Level>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            enable_stdout: true,
            level: None,
        }
    }
}

impl LayerConfig {
    /// Defaults, with `level` taken from `LOG_SINK_LEVEL` when it parses.
    pub fn from_env() -> Self {
        let level = env_or(LOG_SINK_LEVEL_ENV, "").parse().ok();
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to `handler`.
///
/// **Returns**
/// - the background writer task; it finishes once the subscriber is gone
///   and the queue is drained.
/// - `Err(..)` if a global subscriber was already set.
///
/// Must be called inside a Tokio runtime.
pub fn init_tracing_with_config(
    handler: Arc<dyn Handler>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    if let Some(level) = config.level {
        handler.set_level(level);
    }

    let (layer, handle) = SinkLayer::new(handler, config.channel_buffer);

    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(handler: Arc<dyn Handler>) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
