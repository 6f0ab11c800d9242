use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LogFormat;

struct ErrorCounterLayer;

impl<S> Layer<S> for ErrorCounterLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            metrics::counter!("tracing_error_events").increment(1);
        }
    }
}

/// Build a `tracing` dispatcher configured for:
/// - JSON or human-readable logs on stderr (stdout is reserved for rendered panels)
/// - EnvFilter that respects `RUST_LOG` (takes precedence) and falls back to `default_level`
/// - `tracing_error_events` counter for ERROR events
pub fn build_dispatch(
    service_name: &'static str,
    default_level: &str,
    format: LogFormat,
) -> tracing::Dispatch {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorCounterLayer);

    let dispatch = match format {
        LogFormat::Json => tracing::Dispatch::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .json(),
            ),
        ),
        LogFormat::Pretty => tracing::Dispatch::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            ),
        ),
    };

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::debug!(service = service_name, ?format, "tracing initialised");
    });
    dispatch
}

/// Install the dispatcher from [`build_dispatch`] as the process-wide default.
pub fn init(service_name: &'static str, default_level: &str, format: LogFormat) -> anyhow::Result<()> {
    let dispatch = build_dispatch(service_name, default_level, format);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)
}
