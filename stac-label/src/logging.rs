//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! Filtering is controlled by an [`EnvFilter`] (usually from `RUST_LOG`),
//! output by a [`LogFormat`].

use std::io;
use std::str::FromStr;

use tracing::dispatcher::{self, SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, single-line logs.
    Full,
    /// A variant of the full format, optimized for short line lengths.
    Compact,
    /// No timestamps, targets or ANSI colors (default).
    #[default]
    Bare,
    /// Multi-line logs for local debugging.
    Pretty,
    /// Newline-delimited JSON logs.
    Json,
}

impl LogFormat {
    /// Installs the global subscriber. Logs go to stderr so stdout stays usable for documents.
    pub fn init(self, env_filter: EnvFilter) -> Result<(), SetGlobalDefaultError> {
        let builder = tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_span_events(FmtSpan::NONE)
            .with_env_filter(env_filter);
        let dispatch = match self {
            Self::Full => builder.finish().into(),
            Self::Compact => builder.compact().finish().into(),
            Self::Pretty => builder.pretty().finish().into(),
            Self::Bare => builder
                .compact()
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .finish()
                .into(),
            Self::Json => builder.json().finish().into(),
        };
        dispatcher::set_global_default(dispatch)
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" | "verbose" => Ok(Self::Pretty),
            "bare" => Ok(Self::Bare),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: json, full, compact, bare or pretty"
            )),
        }
    }
}

/// Builds the log filter from the `RUST_LOG` value, if any.
///
/// The library crate logs at the same level as the tool unless `RUST_LOG` names it explicitly.
#[must_use]
pub fn log_filter(rust_log: Option<String>) -> String {
    const TOOL: &str = "stac_label=";
    const CORE: &str = "stac_label_core=";

    let Some(rust_log) = rust_log else {
        return format!("{TOOL}info,{CORE}info");
    };
    if rust_log.contains(CORE) {
        return rust_log;
    }
    match rust_log.split(',').find_map(|s| s.strip_prefix(TOOL)) {
        Some(level) => format!("{rust_log},{CORE}{level}"),
        None => rust_log,
    }
}

/// Initializes the global tracing subscriber for the given filter and format.
///
/// An invalid filter falls back to `debug`, since whoever set it most likely wants details.
pub fn init_tracing(filter: &str, format: LogFormat) -> Result<(), SetGlobalDefaultError> {
    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!("Warning: Invalid log filter '{filter}', using 'debug' instead");
        EnvFilter::new("debug")
    });
    format.init(env_filter)
}
