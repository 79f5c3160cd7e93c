use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_onboarding_api::api;
use loan_onboarding_api::config::{Config, StorageBackend};
use loan_onboarding_api::db::Database;
use loan_onboarding_api::db_storage::{MemoryRecordStore, PgRecordStore, RecordStore};
use loan_onboarding_api::handlers::AppState;
use loan_onboarding_api::identity::FirebaseVerifier;
use loan_onboarding_api::onboarding::OnboardingService;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the record store and the identity
/// verifier, then serves the onboarding API until Ctrl-C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_onboarding_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (store, database): (Arc<dyn RecordStore>, Option<Database>) = match config.storage_backend {
        StorageBackend::Postgres => {
            let db = Database::new(&config).await?;
            tracing::info!(
                "Database connection pool established ({}-{} connections)",
                config.db_min_connections,
                config.db_max_connections
            );
            if config.run_migrations {
                db.migrate().await?;
            }
            let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(db.clone()));
            (store, Some(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
            (store, None)
        }
    };

    let verifier = FirebaseVerifier::from_config(&config)?;
    tracing::info!(
        "Identity verifier initialized ({}s token cache)",
        config.token_cache_ttl_secs
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        service: OnboardingService::new(store),
        verifier: Arc::new(verifier),
        database: database.clone(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Health stays outside the rate limiter for platform probes
    let onboarding = api::onboarding_routes(state.clone()).layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    let app = api::app(state, onboarding)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(db) = database {
        db.close().await;
    }
    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(origins))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
