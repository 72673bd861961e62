//! gaia-sim cli utils

/// Initialize the logger with a nice formatted output. Everything goes to
/// stderr; stdout belongs to the guest's serial port.
pub fn init_logger() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
