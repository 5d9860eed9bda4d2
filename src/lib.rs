//! userdir is a small user directory: validated user records with unique
//! email addresses, served over HTTP.

#![forbid(unsafe_code)]

mod database;
mod router;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

pub use error::{Result, ServerError};

use config::StoreKind;
use user::{MemoryUserStore, PgUserStore, UserService, UserStore};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub users: UserService,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `GET /metrics` exposes Prometheus metrics.
        .route("/metrics", get(render_metrics))
        .nest("/users", router::users::router())
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: Option<PrometheusHandle>,
) -> std::result::Result<AppState, Box<dyn std::error::Error>> {
    let store: Arc<dyn UserStore> = match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store, users are lost on restart");
            Arc::new(MemoryUserStore::new())
        },
        StoreKind::Postgres => {
            let Some(ref pg) = config.postgres else {
                return Err("missing `postgres` entry on `config.yaml` file".into());
            };

            let db = database::Database::new(
                &pg.address,
                pg.username.as_deref().unwrap_or(database::DEFAULT_CREDENTIALS),
                pg.password.as_deref().unwrap_or(database::DEFAULT_CREDENTIALS),
                pg.database.as_deref().unwrap_or(database::DEFAULT_DATABASE_NAME),
                pg.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?;

            // execute migrations scripts on start.
            sqlx::migrate!().run(&db.postgres).await?;

            Arc::new(PgUserStore::new(db.postgres))
        },
    };

    Ok(AppState {
        config,
        users: UserService::with_store(store),
        metrics,
    })
}
