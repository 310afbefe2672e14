use analysis_core::{AnalysisError, AnalysisRequest, AnalysisResult, AnalysisService};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Message returned for every server-side failure; details stay in the logs
const SERVER_ERROR_DETAIL: &str = "Engine analysis failed";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine_available: bool,
    pub version: String,
}

/// Request failure mapped onto an HTTP status with a `{"detail": ...}` body
#[derive(Debug)]
pub enum ApiError {
    /// Body missing, not JSON, or not shaped like an analysis request
    Body(JsonRejection),
    Analysis(AnalysisError),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::Analysis(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Body(rejection) => {
                let detail = rejection.body_text();
                warn!(detail = %detail, "Rejected request body");
                return (rejection.status(), Json(json!({ "detail": detail }))).into_response();
            }
            ApiError::Analysis(err) => err,
        };
        let (status, detail) = if err.is_client_error() {
            warn!(error = %err, "Rejected analysis request");
            (StatusCode::BAD_REQUEST, err.to_string())
        } else {
            error!(error = %err, "Stockfish analysis failed");
            let status = match &err {
                AnalysisError::EngineUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, SERVER_ERROR_DETAIL.to_string())
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Routes without middleware
pub fn router(service: Arc<AnalysisService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/analyse", post(analyse))
        .with_state(state)
}

/// Routes with request tracing and CORS
pub fn app(service: Arc<AnalysisService>, allowed_origins: &[String]) -> Router {
    router(service)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn analyse(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(request) = payload?;
    let result = state.service.analyse(&request).await?;
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine_available = state.service.engine_health().await.is_available();
    Json(HealthResponse {
        status: if engine_available { "ok" } else { "degraded" }.to_string(),
        engine_available,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_returns_message() {
        let response = ApiError::Analysis(AnalysisError::malformed("must have at least 4 parts")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid FEN: must have at least 4 parts");
    }

    #[tokio::test]
    async fn test_engine_unavailable_hides_detail() {
        let response =
            ApiError::Analysis(AnalysisError::engine_unavailable("failed to launch /usr/games/stockfish"))
                .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["detail"], SERVER_ERROR_DETAIL);
    }

    #[tokio::test]
    async fn test_no_moves_is_internal_error() {
        let response = ApiError::Analysis(AnalysisError::NoMovesReturned {
            position: "8/8/8/8/8/8/8/K6k w - -".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], SERVER_ERROR_DETAIL);
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            engine_available: true,
            version: "0.1.0".to_string(),
        };
        let json = serde_json::to_string(&response).expect("Should serialize");
        assert!(json.contains("\"engine_available\":true"));
        assert!(json.contains("\"status\":\"ok\""));
    }

    async fn allowed_origin(allowed: &[&str], origin: &str) -> Option<String> {
        let allowed: Vec<String> = allowed.iter().map(|o| o.to_string()).collect();
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(cors_layer(&allowed));
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/health")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|value| value.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        assert_eq!(
            allowed_origin(&["*"], "https://www.chess.com").await.as_deref(),
            Some("*")
        );
        assert_eq!(
            allowed_origin(&[], "https://www.chess.com").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_cors_list_echoes_listed_origin_only() {
        let allowed = ["https://www.chess.com", "not a header\n"];
        assert_eq!(
            allowed_origin(&allowed, "https://www.chess.com").await.as_deref(),
            Some("https://www.chess.com")
        );
        assert_eq!(allowed_origin(&allowed, "https://evil.example").await, None);
    }
}
