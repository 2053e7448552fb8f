//! Log setup for `runtests`.
//!
//! Stdout belongs to the CI annotations the run emits, so every log line,
//! including the `probci.run` and `probci.problem` spans, goes to stderr.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide subscriber.
///
/// `level` is `INFO`, or `DEBUG` under `--verbose`, and only applies when
/// `RUST_LOG` is unset. `--json` switches to one JSON object per line for
/// log collectors. A second call is a no-op, so tests may call it freely.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
