// Logging init: structured events to stderr so stdout stays clean for
// `--json` output.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,wp_media_upload=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `verbose` raises this crate to `debug`.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,wp_media_upload=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    // A second init (e.g. from tests) is not an error worth failing on.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
