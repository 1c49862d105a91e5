//! Logging and error tracking setup for the storefront binary.
//!
//! Sentry must be initialized before the subscriber so the tracing layer
//! has a client to forward to. Warnings and errors become Sentry events,
//! info and debug lines become breadcrumbs on the next event.

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, StorefrontConfig};

/// Used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "pencraft_storefront=info,tower_http=debug";

/// Start Sentry when a DSN is configured. Keep the guard alive for the
/// life of the process.
#[must_use]
pub fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));
    Some(guard)
}

/// How a log line at `level` reaches Sentry.
#[must_use]
pub fn sentry_filter_for(level: Level) -> EventFilter {
    match level {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

/// Install the global subscriber: env filter, Sentry layer, then text or
/// JSON output.
pub fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            sentry_tracing::layer().event_filter(|metadata| sentry_filter_for(*metadata.level())),
        );

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
