mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::i18n::I18n;
use crate::core::openapi::{build_document, docs_path, DocVariant};
use crate::core::{database, middleware};
use crate::features::curriculums::{routes as curriculums_routes, CurriculumService};
use crate::modules::storage::{S3ObjectStore, StorageService};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

/// Swagger UI for both audiences, optionally behind basic auth
fn docs_router(config: &Config) -> Router {
    let mut docs = Router::new();
    for variant in [DocVariant::Web, DocVariant::Mobile] {
        let path = docs_path(&config.app.api_version, variant);
        let document = build_document(variant, &config.app.api_version, &config.app.base_path());
        docs = docs.merge(SwaggerUi::new(path.clone()).url(format!("{}/openapi.json", path), document));
    }

    if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        docs.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
            credentials,
        ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        docs
    }
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let default_filter = if config.app.is_development() {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );
    tracing::info!(
        "Configuration loaded (environment: '{}', base path: {})",
        config.app.environment,
        config.app.base_path()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!(
        "Database connection pool created (time zone: {})",
        config.database.timezone
    );

    if config.database.synchronize {
        tracing::info!("Running database migrations...");
        database::run_migrations(&pool)
            .await
            .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
        tracing::info!("Database migrations completed successfully");
    } else {
        tracing::info!("DB_SYNCHRONIZE is off, skipping migrations");
    }

    let i18n = Arc::new(I18n::load()?);
    tracing::info!(
        "Message catalogs loaded (fallback language: {})",
        i18n.fallback_language()
    );

    let object_store = S3ObjectStore::new(&config.s3)
        .map_err(|e| anyhow::anyhow!("Failed to initialize S3 object store: {}", e))?;
    tracing::info!("Storage ready for bucket: {}", object_store.bucket_name());
    let storage = Arc::new(StorageService::new(Arc::new(object_store), &config.s3));

    let curriculum_service = Arc::new(CurriculumService::new(pool.clone(), storage));
    tracing::info!("Curriculum service initialized");

    let api_routes = middleware::normalize_success(
        Router::new().merge(curriculums_routes::routes(curriculum_service)),
        Arc::clone(&i18n),
    );

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let base_path = config.app.base_path();
    let app = Router::new()
        .merge(docs_router(&config))
        .nest(&base_path, api_routes)
        .merge(health_route);

    let app = middleware::normalize_failures(app, i18n)
        .layer(middleware::cors_layer(&config.cors))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}{}", addr, base_path);
    tracing::info!(
        "API docs available at http://{}{} and http://{}{}",
        addr,
        docs_path(&config.app.api_version, DocVariant::Web),
        addr,
        docs_path(&config.app.api_version, DocVariant::Mobile)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
