use tracing_subscriber::{fmt, EnvFilter};

/// Maps the number of `-v` flags to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,pantry_planner=info",
        2 => "info,pantry_planner=debug",
        _ => "debug,pantry_planner=trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the verbosity flags.
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
