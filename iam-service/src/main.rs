//! iam-service entry point.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iam_service::cache::{Cache, RedisCache};
use iam_service::config::AppConfig;
use iam_service::services::{AuditService, AuthService, AuthorizationService, PermissionsService, PresenceOnlyMfaVerifier, SessionManager};
use iam_service::{build_router, db, run_session_sweeper, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    init_tracing(&config);
    iam_core::middleware::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "starting iam-service"
    );

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("PostgreSQL connection pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("database migrations completed");

    let cache = Arc::new(RedisCache::new(&config.redis.url).await?) as Arc<dyn Cache>;
    tracing::info!("cache connection established");

    let sessions = SessionManager::new(pool.clone(), cache.clone(), config.session.clone());
    let audit = AuditService::new(pool.clone());
    let mfa = Arc::new(PresenceOnlyMfaVerifier);
    let auth = AuthService::new(pool.clone(), sessions.clone(), audit.clone(), mfa, config.login_security.clone());
    let authorization = AuthorizationService::new(pool.clone(), audit.clone());
    let permissions = PermissionsService::new(pool.clone());

    let state = AppState {
        pool,
        cache,
        config: config.clone(),
        sessions: sessions.clone(),
        auth,
        authorization,
        permissions,
        audit,
    };

    tokio::spawn(run_session_sweeper(
        sessions,
        Duration::from_secs(config.session.sweep_interval_seconds),
    ));

    let router = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        },
    }
}

/// Initialize tracing with JSON-formatted logs for log aggregation. When
/// `OTLP_ENDPOINT` is configured, spans are also exported over OTLP.
fn init_tracing(config: &AppConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if let Some(ref otlp_endpoint) = config.otlp_endpoint {
        let otlp_exporter = opentelemetry_otlp::new_exporter().tonic().with_endpoint(otlp_endpoint);

        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(otlp_exporter)
            .with_trace_config(
                sdktrace::Config::default().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name.clone()),
                    KeyValue::new("service.version", config.service_version.clone()),
                ])),
            )
            .install_batch(runtime::Tokio)
        {
            Ok(tracer) => {
                let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(telemetry)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_file(true)
                            .with_line_number(true)
                            .with_target(true)
                            .json()
                            .flatten_event(true),
                    )
                    .init();
                return;
            }
            Err(e) => {
                eprintln!(
                    "failed to initialize OTLP tracer (endpoint: {}): {}. falling back to JSON-only logging.",
                    otlp_endpoint, e
                );
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .json()
                .flatten_event(true),
        )
        .init();
}
