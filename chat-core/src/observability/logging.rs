use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TEST_INIT: Once = Once::new();

/// Install the global subscriber: env filter, JSON lines on stderr, and an
/// OTLP exporter when `otlp_endpoint` is set.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    otlp_endpoint: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let telemetry = match otlp_endpoint {
        Some(endpoint) => {
            let tracer = build_tracer(service_name, endpoint)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init()?;

    Ok(())
}

fn build_tracer(service_name: &str, otlp_endpoint: &str) -> anyhow::Result<sdktrace::Tracer> {
    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to initialize OTLP tracer for '{}' at '{}': {}",
                service_name,
                otlp_endpoint,
                e
            )
        })
}

/// Initialize a plain subscriber for tests (only once per process).
pub fn init_test_tracing() {
    TEST_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,chat_client=debug,chat_core=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
