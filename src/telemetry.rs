//! Telemetry initialization.
//!
//! Controlled by `LMSP_TRACE`:
//! - unset → no subscriber (tracing disabled)
//! - `"stderr"` → JSON events to stderr
//! - `"pretty"` → human-readable events to stderr
//!
//! The level filter comes from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable selecting the telemetry sink.
pub const TRACE_ENV: &str = "LMSP_TRACE";

/// Where tracing events go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceMode {
    Off,
    Json,
    Pretty,
}

impl TraceMode {
    /// Interpret an `LMSP_TRACE` value. Unknown values turn tracing off.
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("stderr" | "json") => Self::Json,
            Some("pretty") => Self::Pretty,
            None | Some("") => Self::Off,
            Some(other) => {
                eprintln!("warning: unknown {TRACE_ENV} value '{other}', tracing disabled");
                Self::Off
            }
        }
    }
}

/// Initialize tracing based on `LMSP_TRACE`.
pub fn init() {
    let mode = TraceMode::from_env_value(std::env::var(TRACE_ENV).ok().as_deref());
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match mode {
        TraceMode::Off => {}
        TraceMode::Json => {
            tracing_subscriber::registry()
                .with(filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
        TraceMode::Pretty => {
            tracing_subscriber::registry()
                .with(filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .init();
        }
    }
}
