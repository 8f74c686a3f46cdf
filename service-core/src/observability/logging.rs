use opentelemetry::KeyValue;
use std::future::Future;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Logs are emitted as flattened JSON on stdout, filtered by `RUST_LOG` or
/// `log_level`. Spans are also exported over OTLP when `otlp_endpoint` is
/// set; an exporter that fails to start is reported and skipped.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let telemetry = otlp_endpoint.and_then(|endpoint| match otlp_tracer(service_name, endpoint) {
        Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
        Err(e) => {
            eprintln!(
                "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                service_name, endpoint, e
            );
            None
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .init();
}

fn otlp_tracer(
    service_name: &str,
    endpoint: &str,
) -> Result<sdktrace::Tracer, opentelemetry::trace::TraceError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio)
}

tokio::task_local! {
    static PANIC_CONTAINED: ();
}

/// Run `future` as code whose panics are caught and handled by the caller.
///
/// While it is being polled the panic hook only logs. Everywhere else a
/// panic is fatal.
pub fn contain_panics<F>(future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    PANIC_CONTAINED.scope((), future)
}

/// Whether the current code runs inside [`contain_panics`].
pub fn panics_are_contained() -> bool {
    PANIC_CONTAINED.try_with(|_| ()).is_ok()
}

/// Route panic reports through `tracing` so they reach the JSON log stream.
///
/// The default hook still runs afterwards. A panic outside
/// [`contain_panics`] then terminates the process with exit code 1, so
/// unexpected faults in handlers or connection tasks are not swallowed by
/// tokio.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        if panics_are_contained() {
            tracing::error!(panic = %info, location = %location, "Contained panic");
            default_hook(info);
            return;
        }

        tracing::error!(panic = %info, location = %location, "Unhandled panic, exiting");
        default_hook(info);
        std::process::exit(1);
    }));
}
