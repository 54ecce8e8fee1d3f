pub mod orders;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::Response,
    routing,
};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::openapi::{InfoBuilder, OpenApi};
use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

pub const LIVENESS_TEXT: &str = "followiz tracker is live";

/// Sent on every response, not only preflights, so browser clients see one policy.
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Defines every route together with its OpenAPI description.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(home)).nest(
        "/api",
        orders::routes_with_openapi().merge(webhooks::routes_with_openapi()),
    )
}

/// Builds the full application: API routes, the OpenAPI document, CORS and tracing.
pub fn app(state: AppState) -> Router {
    let (router, mut openapi) = routes_with_openapi().split_for_parts();
    openapi.info = InfoBuilder::new()
        .title("Followiz Tracker API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let openapi: Arc<OpenApi> = Arc::new(openapi);

    router
        .route(
            "/api-docs/openapi.json",
            routing::get(move || {
                let openapi = openapi.clone();
                async move { Json(openapi.as_ref().clone()) }
            }),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::map_response(preflight_no_content))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOWED_METHODS),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOWED_HEADERS),
                ))
                .layer(cors_layer()),
        )
}

/// Any origin may call the API from a browser; only the shop frontend does in practice.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]))
}

/// Preflight replies carry no body, so report them as 204.
async fn preflight_no_content(method: Method, mut response: Response) -> Response {
    if method == Method::OPTIONS && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "text/plain")
    )
)]
async fn home() -> &'static str {
    LIVENESS_TEXT
}

/// Normalises an identifier that may arrive as a JSON string or number. Blank strings
/// count as missing.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
