use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable selecting the log format (`json` or text)
pub const LOG_FORMAT_VAR: &str = "YIELD_SCOUT_LOG_FORMAT";

/// Initialize logging on stderr.
///
/// Honors `RUST_LOG` (default `info`); `YIELD_SCOUT_LOG_FORMAT=json` emits JSON lines.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var(LOG_FORMAT_VAR).as_deref() {
        Ok("json") => {
            let _ = registry.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = registry.with(fmt_layer.compact()).try_init();
        }
    }
}
