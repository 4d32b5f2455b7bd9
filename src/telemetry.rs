//! Telemetry and structured logging for the merge service.

use crate::job::{JobStatus, MergeJob};
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::{global, KeyValue};
use tracing::{info, warn};

/// Slow-request threshold; external conversions routinely take seconds,
/// so anything past this is worth flagging.
const SLOW_REQUEST_MS: i64 = 30_000;

/// Records telemetry for a completed or failed merge job.
///
/// Emits one span per request with duration, outcome, file and page
/// counts, plus structured logs for pipeline health monitoring.
pub fn record_job_telemetry(job: &MergeJob) {
    let tracer = global::tracer("deckmerge");
    let mut span = tracer.start("merge_job");

    span.set_attribute(KeyValue::new("job_id", job.job_id.clone()));
    span.set_attribute(KeyValue::new("status", job.status.to_string()));
    span.set_attribute(KeyValue::new("file_count", job.file_count as i64));

    if let Some(total_pages) = job.total_pages {
        span.set_attribute(KeyValue::new("total_pages", total_pages as i64));
    }

    if let Some(duration_ms) = job.processing_duration_ms() {
        span.set_attribute(KeyValue::new("duration_ms", duration_ms));

        info!(
            job_id = %job.job_id,
            file_count = job.file_count,
            total_pages = ?job.total_pages,
            duration_ms = duration_ms,
            status = %job.status,
            "Merge job finished"
        );

        if duration_ms > SLOW_REQUEST_MS {
            warn!(
                job_id = %job.job_id,
                duration_ms = duration_ms,
                "Merge job exceeded performance threshold ({SLOW_REQUEST_MS}ms)"
            );
        }
    }

    if job.status == JobStatus::Failed {
        if let Some(ref error) = job.error {
            span.set_attribute(KeyValue::new("error", error.clone()));
            warn!(
                job_id = %job.job_id,
                error = %error,
                "Merge job failed"
            );
        }
    }

    span.end();
}

/// Initializes OpenTelemetry with an OTLP exporter.
///
/// Called once at startup. Reads configuration from environment
/// variables:
/// - `OTEL_EXPORTER_OTLP_ENDPOINT` - Collector endpoint (default: http://localhost:4317)
/// - `OTEL_SERVICE_NAME` - Service name (default: deckmerge)
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::Config;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "deckmerge".to_string());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(&endpoint),
        )
        .with_trace_config(Config::default().with_resource(
            opentelemetry_sdk::Resource::new(vec![
                KeyValue::new("service.name", service_name),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    global::set_tracer_provider(tracer.provider().unwrap());

    info!("Telemetry initialized: endpoint={}", endpoint);
    Ok(())
}
