//! Process-wide tracing subscriber setup.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies. HTTP client internals are capped
/// at `warn`. Output goes to stderr; stdout is reserved for command results. Calling this
/// twice returns an error instead of panicking.
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("invalid log level {level:?}: {e}"))?
        .add_directive("hyper=warn".parse()?)
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(filter)
            .try_init()
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!(level, json, "logging initialized");
    Ok(())
}
