//! Unified logging for pipeline diagnostics.
//!
//! Every subsystem logs under its own target (`repository`, `chunking`,
//! `keyword`, `filetree`, `retrieval`, `oracle`), so verbosity can be tuned
//! per stage.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"     # quiet by default
//!
//! [logging.modules]
//! retrieval = "info"   # stage progress
//! oracle = "debug"     # every decision round
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=retrieval=info,oracle=debug coderecall retrieve acme/app:. -q "..."
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the `EnvFilter` directive string from configuration.
///
/// Module overrides are emitted in sorted order so the directive is stable.
pub fn filter_directive(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();

    let mut directive = config.default.clone();
    for (module, level) in modules {
        directive.push_str(&format!(",{module}={level}"));
    }
    directive
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
/// Logs go to stderr so that command output on stdout stays machine-readable.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directive(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Log a pipeline event at info level.
///
/// # Examples
/// ```ignore
/// log_event!("retrieval", "stage finished", "EDL found {} files", files.len());
/// ```
#[macro_export]
macro_rules! log_event {
    ($target:expr, $event:expr) => {
        tracing::info!(target: $target, "{}", $event)
    };
    ($target:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!(target: $target, "{}: {}", $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("oracle", "round", "{} of {}", round, max_rounds);
/// ```
#[macro_export]
macro_rules! debug_event {
    ($target:expr, $event:expr) => {
        tracing::debug!(target: $target, "{}", $event)
    };
    ($target:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!(target: $target, "{}: {}", $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directive_default() {
        assert_eq!(filter_directive(&LoggingConfig::default()), "warn");
    }

    #[test]
    fn test_filter_directive_with_modules() {
        let config = LoggingConfig {
            default: "error".to_string(),
            modules: HashMap::from([
                ("retrieval".to_string(), "info".to_string()),
                ("oracle".to_string(), "debug".to_string()),
            ]),
        };
        assert_eq!(
            filter_directive(&config),
            "error,oracle=debug,retrieval=info"
        );
    }
}
