//! Logging and optional OpenTelemetry setup
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `ytflow=info`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: Service name (default: ytflow-daemon)
//!
//! # Example
//!
//! ```text
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//! OTEL_SERVICE_NAME=ytflow-dev \
//!     ./ytflow-daemon
//! ```

use crate::config::LogFormat;
use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ytflow=info";

/// Flushes exported spans on drop
pub struct TelemetryGuard {
    otel_enabled: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.otel_enabled {
            otel::shutdown();
        }
    }
}

/// Install the global subscriber
pub fn init(format: LogFormat) -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow!("Failed to create env filter: {}", e))?;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let (otel_layer, otel_error) = match endpoint.as_deref() {
        Some(endpoint) => match otel::layer(endpoint) {
            Ok(layer) => (layer, None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };
    let otel_enabled = otel_layer.is_some();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    match format {
        // Production: JSON structured logging
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    match (endpoint, otel_error) {
        (_, Some(e)) => {
            tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)")
        }
        (Some(endpoint), None) if otel_enabled => {
            tracing::info!(endpoint = %endpoint, "OpenTelemetry initialized")
        }
        (Some(_), None) => {
            tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
            tracing::warn!("Rebuild with: cargo build --features telemetry");
        }
        (None, None) => {
            tracing::debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)")
        }
    }

    Ok(TelemetryGuard { otel_enabled })
}

#[cfg(feature = "telemetry")]
mod otel {
    use anyhow::Result;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;
    use opentelemetry_sdk::Resource;
    use tracing::Subscriber;
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    pub fn layer<S>(endpoint: &str) -> Result<Option<impl Layer<S>>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "ytflow-daemon".to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service_name.clone(),
            )]))
            .build();

        let tracer = provider.tracer(service_name);
        opentelemetry::global::set_tracer_provider(provider);

        Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer)))
    }

    pub fn shutdown() {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use anyhow::Result;
    use tracing_subscriber::layer::Identity;

    pub fn layer(_endpoint: &str) -> Result<Option<Identity>> {
        Ok(None)
    }

    pub fn shutdown() {}
}
