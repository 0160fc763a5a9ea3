use axum::{
    Extension, Json, Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use eyre::WrapErr;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use storefront_api_rs::{
    config, metrics,
    models::{ApiError, OfferResponse, SubmissionResponse},
    security::{AccessToken, SessionSlots, require_access_token},
    storefront::{OfferError, OfferFetcher, StorefrontClient},
    submission::{
        FileUpload, FormValue, Notification, RawFormInput, SubmissionError, SubmissionPipeline,
    },
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "storefront.api", "server crashed: {err:?}");
    }
}

async fn run() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .wrap_err("installing prometheus recorder")?;
    let state = AppState {
        client: StorefrontClient::from_env(),
        slots: SessionSlots::default(),
        openapi: Arc::new(load_openapi()),
        prometheus_handle,
    };
    info!(target = "storefront.api", backend = %config::API_ROOT.as_str(), "storefront backend configured");

    let app = router(state);
    let addr: SocketAddr = ([0, 0, 0, 0], config::port_from_env()).into();
    info!(target = "storefront.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("binding {addr}"))?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    client: StorefrontClient,
    slots: SessionSlots,
    openapi: Arc<serde_json::Value>,
    prometheus_handle: PrometheusHandle,
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let protected = Router::new()
        .route("/offers/me", get(user_offer))
        .route("/products", post(create_product))
        .route_layer(middleware::from_fn(require_access_token));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .merge(protected)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(
                    config::body_limit_from_env(),
                )),
        )
}

fn load_openapi() -> serde_json::Value {
    serde_yaml::from_str(include_str!("../docs/openapi.yaml"))
        .unwrap_or_else(|_| json!({ "openapi": "3.0.3" }))
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
/// - Auth: none
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "storefront-api-rs",
    }))
}

async fn openapi_json(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Ok(key) = std::env::var("OPENAPI_KEY")
        && !key_matches(&headers, "X-Docs-Key", &key)
    {
        return Err(AppError::Unauthorized("docs"));
    }
    Ok(Json((*state.openapi).clone()))
}

async fn metrics_endpoint(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Ok(secret) = std::env::var("METRICS_KEY")
        && !key_matches(&headers, "X-Metrics-Key", &secret)
    {
        return AppError::Unauthorized("metrics").into_response();
    }
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        state.prometheus_handle.render(),
    )
        .into_response()
}

fn key_matches(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|presented| presented == expected)
}

/// The caller's current shop offer.
///
/// - Method: `GET`
/// - Path: `/offers/me`
/// - Auth: `Authorization: Bearer <token>` (forwarded to the backend)
/// - Response: `{"offer": Offer | null}`
async fn user_offer(
    State(state): State<AppState>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<OfferResponse>, AppError> {
    metrics::inc_requests("/offers/me");
    let fetcher = OfferFetcher::new(state.client.with_token(token.0));
    let offer = fetcher.try_fetch_user_offer().await?;
    Ok(Json(OfferResponse { offer }))
}

/// Validate and forward a product form.
///
/// - Method: `POST`
/// - Path: `/products`
/// - Auth: `Authorization: Bearer <token>` (forwarded to the backend)
/// - Body: `multipart/form-data` product fields and `images_upload` files
/// - Response: `SubmissionResponse`; the notification is always present
async fn create_product(
    State(state): State<AppState>,
    Extension(token): Extension<AccessToken>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    metrics::inc_requests("/products");
    let raw = read_form(multipart).await?;
    let slot = state.slots.slot_for(&token).await;
    let pipeline = SubmissionPipeline::with_slot(state.client.with_token(token.0), slot);

    let result = pipeline.submit(raw).await;
    let notification = Notification::for_result(&result);
    let (status, body) = match result {
        Ok(receipt) => (
            StatusCode::CREATED,
            SubmissionResponse {
                product_id: Some(receipt.product.id),
                submission_id: Some(receipt.submission_id),
                notification,
            },
        ),
        Err(err) => (
            submission_status(&err),
            SubmissionResponse {
                product_id: None,
                submission_id: None,
                notification,
            },
        ),
    };
    Ok((status, Json(body)).into_response())
}

async fn read_form(mut multipart: Multipart) -> Result<RawFormInput, MultipartError> {
    let mut raw = RawFormInput::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                FormValue::File(FileUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                })
            }
            None => FormValue::Text(field.text().await?),
        };
        raw.append(&name, value);
    }
    Ok(raw)
}

fn submission_status(err: &SubmissionError) -> StatusCode {
    match err {
        SubmissionError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::AlreadyInFlight => StatusCode::CONFLICT,
        SubmissionError::Rejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        SubmissionError::Failed { .. } => StatusCode::BAD_GATEWAY,
    }
}

#[derive(Debug)]
enum AppError {
    Offer(OfferError),
    Form(MultipartError),
    Unauthorized(&'static str),
}

impl From<OfferError> for AppError {
    fn from(value: OfferError) -> Self {
        Self::Offer(value)
    }
}

impl From<MultipartError> for AppError {
    fn from(value: MultipartError) -> Self {
        Self::Form(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            AppError::Offer(err) => {
                warn!(target = "storefront.api", error = %err, "offer_lookup_failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError::new("offer_lookup_failed", err.to_string()),
                )
            }
            AppError::Form(err) => (
                err.status(),
                ApiError::new("invalid_form", err.body_text()),
            ),
            AppError::Unauthorized(scope) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new(scope, "unauthorized"),
            ),
        };
        (status, Json(payload)).into_response()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
