use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use opentelemetry_semantic_conventions::resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,familypaw_server=info,sqlx=warn,sea_orm=warn";

/// Installs the global subscriber. `RUST_LOG_FORMAT=json` switches to flat
/// JSON lines; spans are exported when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_telemetry(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .and_then(|endpoint| otlp_tracer(service_name, endpoint))
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let json = std::env::var("RUST_LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true);
        registry.with(otel_layer).with(fmt_layer).init();
    } else {
        registry.with(otel_layer).with(tracing_subscriber::fmt::layer()).init();
    }
}

fn otlp_tracer(service_name: &str, endpoint: String) -> Option<sdktrace::Tracer> {
    let resource = Resource::new(vec![KeyValue::new(resource::SERVICE_NAME, service_name.to_string())]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(sdktrace::config().with_resource(resource).with_sampler(sdktrace::Sampler::AlwaysOn))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .map_err(|e| eprintln!("OpenTelemetry exporter disabled: {e}"))
        .ok()
}
