//! Logging setup for tools embedding the adapters.
//!
//! Only built with the `logging` feature. The library itself just emits
//! `tracing` events; a host that already installs a subscriber never needs this.
//!
//! Filters are scoped to the esload crates so a host's own output is unaffected:
//! `LogLevel::Debug` becomes `esload=debug,esload_loader=debug,esload_plugin_minify=debug`.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable read by [`init_logging_from_env`], before `RUST_LOG`.
pub const LOG_ENV: &str = "ESLOAD_LOG";

const TARGETS: [&str; 3] = ["esload", "esload_loader", "esload_plugin_minify"];

static INIT: Once = Once::new();

/// Verbosity of esload's own events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Silent,
    Error,
    /// Includes esbuild warnings for minified assets (default)
    #[default]
    Warn,
    Info,
    /// One event per transformed module or asset batch
    Debug,
    /// Full service requests and spawned esbuild command lines
    Trace,
}

impl LogLevel {
    fn name(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter directives limited to the esload crates.
    pub fn directives(self) -> String {
        TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.name()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" | "none" => LogLevel::Silent,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            other => return Err(format!("unknown esload log level `{other}`")),
        };
        Ok(level)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        // A subscriber installed by the host takes precedence.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(true).without_time())
            .try_init();
    });
}

/// Install a stderr subscriber showing esload events at `level`.
///
/// ```rust,no_run
/// use esload::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    install(EnvFilter::new(level.directives()));
}

/// Like [`init_logging`], with the level taken from `ESLOAD_LOG`.
///
/// A value that is not a [`LogLevel`] name is used as a raw filter directive
/// (e.g. `ESLOAD_LOG=esload::service=trace`). Without `ESLOAD_LOG`, `RUST_LOG`
/// applies, then the default level.
pub fn init_logging_from_env() {
    let filter = match std::env::var(LOG_ENV) {
        Ok(value) => match value.parse::<LogLevel>() {
            Ok(level) => EnvFilter::new(level.directives()),
            Err(_) => EnvFilter::new(value),
        },
        Err(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().directives())),
    };
    install(filter);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!(" Warning ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("none".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            LogLevel::Debug.directives(),
            "esload=debug,esload_loader=debug,esload_plugin_minify=debug"
        );
        assert_eq!(LogLevel::Silent.to_string(), "off");
    }

    #[test]
    fn levels_are_ordered_by_verbosity() {
        assert!(LogLevel::Silent < LogLevel::Error);
        assert!(LogLevel::Debug < LogLevel::Trace);
        assert_eq!(LogLevel::default(), LogLevel::Warn);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LogLevel::Warn);
        init_logging(LogLevel::Trace);
        init_logging_from_env();
    }
}
