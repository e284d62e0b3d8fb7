use std::env::var;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing at `INFO` unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
    init_tracing_with_level(LevelFilter::INFO);
}

/// Initialize the global tracing subscriber.
///
/// `level` is only the default directive; `RUST_LOG` always wins.
/// `RUST_LOG_FORMAT=json` selects JSON lines, anything else the compact
/// human-readable format.
pub fn init_tracing_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer().compact().with_target(false).with_filter(env_filter).boxed(),
    };

    if tracing_subscriber::registry().with(log_layer).try_init().is_err() {
        warn!("Tracing subscriber already initialized, keeping the existing one");
    }
}
