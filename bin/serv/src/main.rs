use std::net::SocketAddr;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use lms_api::{
    config::ApiConfig,
    metrics::{init_metrics, metrics_handler, track_metrics},
    middleware::{
        cors::create_cors_layer, rate_limit::apply_rate_limit,
        request_id::request_id_middleware, security_headers::apply_security_headers,
    },
    state::ApiState,
    tracing::init_tracing,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from .env and the environment
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    init_tracing(config.env)?;
    let metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let pool = lms_db::create_pool(&config.database_url, config.db_max_connections).await?;
    lms_db::ensure_db_and_migrate(&config.database_url, &pool).await?;
    tracing::info!("database ready");

    let state = ApiState::new(&config, pool);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Kept out of the API router so scrapes skip auth and the API middleware
    let metrics_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = lms_api::router::router()
        .with_state(state)
        .merge(metrics_app)
        .layer(create_cors_layer(&config.parsed_allowed_origins()))
        .layer(trace_layer)
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn(request_id_middleware));

    let app = apply_security_headers(app, config.env);
    let app = apply_rate_limit(app, config.rate_limit_per_second, config.rate_limit_burst)?;

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        address = %address,
        environment = ?config.env,
        "server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
