//! Progress HTTP server.
//!
//! Exposes the progress engine to the presentation layer and to task
//! producers. The caller's identity is taken from the `x-user-id` header,
//! which the upstream auth layer sets after validating the session.

use axum::{
    error_handling::HandleErrorLayer,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, State,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    BoxError, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::domain::errors::DomainError;
use crate::domain::models::{ProgressSnapshot, ServerConfig};
use crate::domain::ports::ProgressRepository;
use crate::services::ProgressService;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Configuration for the progress HTTP server.
#[derive(Debug, Clone)]
pub struct ProgressHttpConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allow any origin.
    pub enable_cors: bool,
    /// Requests running longer than this are answered with 408.
    pub request_timeout: Duration,
}

impl Default for ProgressHttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ProgressHttpConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Body of `POST /api/progress/{task_kind}`.
#[derive(Debug, Deserialize)]
pub struct SetCompletionRequest {
    /// New value for the task flag.
    pub completed: bool,
}

/// Body of `DELETE /api/users/{user_id}/progress`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserResponse {
    /// User id from the path.
    pub user_id: String,
    /// Whether a record existed.
    pub removed: bool,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable code.
    pub code: String,
    /// Whether the same request may succeed later.
    pub retryable: bool,
}

/// Errors a handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// No usable [`USER_ID_HEADER`].
    Unauthorized,
    /// Malformed body or path, rejected before the handler ran.
    BadRequest(String),
    /// No route matches the request.
    NotFound,
    /// The request ran past the configured timeout.
    Timeout,
    /// Middleware failure other than a timeout.
    Internal(String),
    /// Error returned by the engine.
    Domain(DomainError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Domain(DomainError::InvalidTaskKind(_) | DomainError::InvalidUserId(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Domain(DomainError::StorageError(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Domain(DomainError::SerializationError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Unauthorized => ErrorResponse {
                error: format!("missing {USER_ID_HEADER} header"),
                code: "UNAUTHORIZED".to_string(),
                retryable: false,
            },
            Self::BadRequest(message) => ErrorResponse {
                error: message.clone(),
                code: "INVALID_REQUEST".to_string(),
                retryable: false,
            },
            Self::NotFound => ErrorResponse {
                error: "no route for this request".to_string(),
                code: "NOT_FOUND".to_string(),
                retryable: false,
            },
            Self::Timeout => ErrorResponse {
                error: "request timed out".to_string(),
                code: "REQUEST_TIMEOUT".to_string(),
                retryable: true,
            },
            Self::Internal(message) => ErrorResponse {
                error: message.clone(),
                code: "INTERNAL_ERROR".to_string(),
                retryable: false,
            },
            Self::Domain(err) => ErrorResponse {
                error: err.to_string(),
                code: err.code().to_string(),
                retryable: err.is_retryable(),
            },
        };

        if status.is_server_error() {
            tracing::error!(status = %status, code = %body.code, "{}", body.error);
        } else {
            tracing::debug!(status = %status, code = %body.code, "{}", body.error);
        }

        (status, Json(body)).into_response()
    }
}

/// Authenticated caller, extracted from [`USER_ID_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(|value| Self(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

/// JSON body extractor whose rejections answer with [`ErrorResponse`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections answer with [`ErrorResponse`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

type SharedService<R> = Arc<ProgressService<R>>;

/// Progress HTTP server.
pub struct ProgressHttpServer<R: ProgressRepository + 'static> {
    config: ProgressHttpConfig,
    service: SharedService<R>,
}

impl<R: ProgressRepository + 'static> ProgressHttpServer<R> {
    /// Server for `service`; nothing is bound until served.
    pub fn new(service: SharedService<R>, config: ProgressHttpConfig) -> Self {
        Self { config, service }
    }

    /// Router with every route and middleware layer.
    pub fn build_router(&self) -> Router {
        let app = Router::new()
            .route("/health", get(health_check))
            .route("/api/progress", get(get_progress::<R>))
            .route("/api/progress/reset", post(reset_daily::<R>))
            .route("/api/progress/{task_kind}", post(set_task_completion::<R>))
            .route(
                "/api/users/{user_id}/progress",
                put(register_user::<R>).delete(remove_user::<R>),
            )
            .fallback(not_found)
            .with_state(Arc::clone(&self.service));

        let app = if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        } else {
            app
        };

        app.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(self.config.request_timeout),
        )
    }

    /// Bind to the configured address and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        tracing::info!(addr = %listener.local_addr()?, "progress HTTP server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_progress<R: ProgressRepository + 'static>(
    State(service): State<SharedService<R>>,
    UserId(user_id): UserId,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    Ok(Json(service.get_progress(&user_id).await?))
}

async fn set_task_completion<R: ProgressRepository + 'static>(
    State(service): State<SharedService<R>>,
    UserId(user_id): UserId,
    ApiPath(task_kind): ApiPath<String>,
    ApiJson(request): ApiJson<SetCompletionRequest>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    let snapshot = service
        .set_task_completion_str(&user_id, &task_kind, request.completed)
        .await?;
    Ok(Json(snapshot))
}

async fn reset_daily<R: ProgressRepository + 'static>(
    State(service): State<SharedService<R>>,
    UserId(user_id): UserId,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    Ok(Json(service.reset_daily(&user_id).await?))
}

async fn register_user<R: ProgressRepository + 'static>(
    State(service): State<SharedService<R>>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    Ok(Json(service.register_user(&user_id).await?))
}

async fn remove_user<R: ProgressRepository + 'static>(
    State(service): State<SharedService<R>>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<RemoveUserResponse>, ApiError> {
    let removed = service.remove_user(&user_id).await?;
    Ok(Json(RemoveUserResponse { user_id, removed }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_server_section() {
        let config = ProgressHttpConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5050);
        assert!(config.enable_cors);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (ApiError::Timeout, StatusCode::REQUEST_TIMEOUT),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::InvalidTaskKind("x".into()).into(), StatusCode::BAD_REQUEST),
            (DomainError::InvalidUserId(String::new()).into(), StatusCode::BAD_REQUEST),
            (DomainError::StorageError("down".into()).into(), StatusCode::SERVICE_UNAVAILABLE),
            (
                DomainError::SerializationError("bad row".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected);
        }
    }

    #[test]
    fn test_set_completion_request_deserialization() {
        let request: SetCompletionRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert!(request.completed);
        assert!(serde_json::from_str::<SetCompletionRequest>("{}").is_err());
    }
}
