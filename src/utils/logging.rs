use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset: this crate's upload events plus the
/// per-request spans emitted by `TraceLayer`.
pub const DEFAULT_DIRECTIVES: &str = "image_upload_server=debug,tower_http=debug";

pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_file(true).with_line_number(true))
        .try_init()?;

    Ok(())
}
