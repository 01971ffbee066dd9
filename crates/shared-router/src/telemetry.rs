use std::sync::OnceLock;

use shared_config::Application;
use tracing::{Span, info, info_span};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static APP_SPAN: OnceLock<Span> = OnceLock::new();

/// Install the global JSON subscriber.
///
/// `RUST_LOG` wins when set; otherwise the application's `log_level` is
/// used, and an unrecognised level falls back to `error`. Every request
/// served by [`router`](crate::router) is logged inside [`app_span`], so
/// each line carries the `application` name.
pub fn init(app: &Application) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(&app.log_level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .try_init()?;

    let span = APP_SPAN.get_or_init(|| service_span(app));
    span.in_scope(|| info!(port = app.port, "logging initialised"));
    Ok(())
}

/// Span naming the application, for instrumenting work outside the router.
/// Disabled until [`init`] has run.
pub fn app_span() -> Span {
    APP_SPAN.get().cloned().unwrap_or_else(Span::none)
}

fn service_span(app: &Application) -> Span {
    info_span!("service", application = %app.name)
}

fn default_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::ERROR)
}
