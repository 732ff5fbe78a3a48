//! Tracing setup for the `compliancy` binary.
//!
//! The gate prints its decision (run context, gate report) as JSON on stdout,
//! so every log line goes to stderr. Without `RUST_LOG` the gate's own crates
//! log at the requested level while the HTTP stack stays at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events follow the requested verbosity.
const GATE_TARGETS: &[&str] = &[
    "compliancy",
    "compliancy_core",
    "compliancy_azdo",
    "compliancy_state",
];

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let scoped = GATE_TARGETS.iter().map(|target| format!("{target}={level}"));
    std::iter::once("warn".to_string())
        .chain(scoped)
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Later calls are no-ops.
///
/// `json` switches stderr output to newline-delimited JSON, one object per
/// event, for pipeline log collectors.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let stderr = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(stderr.json()).try_init().ok();
    } else {
        registry.with(stderr).try_init().ok();
    }
}
