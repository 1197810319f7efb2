//! Log output for relguard.
//!
//! relguard shares the terminal with the tools it drives: their stdout and
//! stderr are inherited, and CI logs interleave both. relguard's own events
//! therefore go to stderr only, without module targets, so a build log reads
//! as tool output punctuated by "stamped", "restored" and "build finished"
//! lines. `--json` switches those lines to newline-delimited JSON for log
//! collectors; `RUST_LOG` still wins over `--verbose`.

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter from `RUST_LOG`, falling back to `level` when it is unset or
/// unparsable.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Install the process-wide subscriber. Later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let layer = if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(layer)
        .try_init()
        .ok();
}
