use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

/// Default tenant ID used when x-tenant-id header is missing.
const UNKNOWN_TENANT: &str = "unknown";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder backing the `counter!`/`histogram!`
/// calls below. Must run once at startup before any request is served;
/// a second call is a no-op rather than a panic, since tests may spin up
/// more than one router in-process.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to install Prometheus recorder");
        }
    }
}

/// Renders the current metrics snapshot for a `/metrics` scrape.
pub fn render_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# metrics recorder not initialized\n".to_string())
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    // Extract tenant_id from x-tenant-id header for metering
    let tenant_id = req
        .headers()
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN_TENANT)
        .to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method),
        ("path", path),
        ("status", status),
        ("tenant_id", tenant_id),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    response
}
