use std::sync::LazyLock;

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const FALLBACK_LEVEL: &str = "warn";

/// Picks the log filter: `RUST_LOG` first, then the configured level, then `warn`.
///
/// A directive that does not parse is skipped; the returned message says why.
pub fn resolve_filter(
    env_directive: Option<&str>,
    configured_level: &str,
) -> (EnvFilter, Option<String>) {
    let mut skipped = None;

    if let Some(directive) = env_directive {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return (filter, None),
            Err(e) => {
                skipped = Some(format!("ignoring invalid RUST_LOG '{directive}': {e}"));
            }
        }
    }

    match EnvFilter::try_new(configured_level) {
        Ok(filter) => (filter, skipped),
        Err(e) => (
            EnvFilter::new(FALLBACK_LEVEL),
            Some(format!("ignoring invalid log level '{configured_level}': {e}")),
        ),
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays parseable.
pub fn enable_logging(configured_level: &str) -> Result<()> {
    let env_directive = std::env::var("RUST_LOG").ok();
    let (filter, skipped) = resolve_filter(env_directive.as_deref(), configured_level);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    if let Some(reason) = skipped {
        tracing::warn!("{reason}");
    }
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
});
