use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up the logging subscriber for the application.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at INFO and the HTTP
/// trace layer at DEBUG.
pub fn init_logger() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},tower_http={}",
            env!("CARGO_CRATE_NAME"),
            Level::INFO,
            Level::DEBUG
        ))
    });

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    // A second init (tests, embedding) keeps the existing subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
