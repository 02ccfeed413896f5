//! JSON HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`   | `/api/` | Liveness message |
//! | `POST`  | `/api/status` | Record a status check |
//! | `GET`   | `/api/status` | List status checks |
//! | `POST`  | `/api/contact` | Submit a contact message |
//! | `GET`   | `/api/contact?limit=N&status=S` | List contact messages, newest first |
//! | `PATCH` | `/api/contact/{id}/status?status=S` | Change a message's status |
//! | `GET`   | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Validation failures (422) list every offending input:
//!
//! ```json
//! { "detail": [{ "loc": ["body", "email"],
//!                "msg": "value is not a valid email address",
//!                "type": "value_error" }] }
//! ```
//!
//! Everything else carries a single message: `{"detail": "Invalid status"}`
//! (400), `{"detail": "Message not found"}` (404), and
//! `{"detail": "Internal server error"}` (500). Internal errors never carry
//! storage diagnostics; those are logged server-side instead.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use mockable::DefaultClock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use portfolio_core::contact::{ContactService, ListQuery};
use portfolio_core::error::{FieldError, ServiceError};
use portfolio_core::models::{ContactMessage, StatusCheck};
use portfolio_core::status_check::StatusCheckService;
use portfolio_core::store::DocumentStore;
use portfolio_core::validation::{ContactSubmission, StatusCheckCreate};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    contacts: ContactService<DefaultClock>,
    status_checks: Arc<StatusCheckService<DefaultClock>>,
}

/// Starts the HTTP server backed by the configured SQLite database.
///
/// Opens the connection pool, makes sure the schema exists, serves until
/// Ctrl-C, and closes the pool on the way out.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let result = run_server_with_store(config, store).await;

    pool.close().await;
    info!("database pool closed");
    result
}

/// Starts the HTTP server over an arbitrary [`DocumentStore`].
///
/// Binds to `[server].bind`; returns once a shutdown signal arrives and
/// in-flight requests have drained.
///
/// # Example
///
/// ```rust,no_run
/// use portfolio_api::server::run_server_with_store;
/// use portfolio_core::store::memory::InMemoryStore;
/// use std::sync::Arc;
///
/// # async fn example(config: &portfolio_api::config::Config) -> anyhow::Result<()> {
/// run_server_with_store(config, Arc::new(InMemoryStore::new())).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_store(
    config: &Config,
    store: Arc<dyn DocumentStore>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()), store);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("portfolio API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Builds the application router with all routes, CORS, and request tracing.
pub fn router(config: Arc<Config>, store: Arc<dyn DocumentStore>) -> Router {
    let clock = Arc::new(DefaultClock);
    let state = AppState {
        contacts: ContactService::new(store.clone(), clock.clone()),
        status_checks: Arc::new(
            StatusCheckService::new(store, clock)
                .with_list_limit(config.status_checks.list_limit),
        ),
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", get(handle_root))
        .route("/api/", get(handle_root))
        .route(
            "/api/status",
            get(handle_list_status_checks).post(handle_create_status_check),
        )
        .route(
            "/api/contact",
            get(handle_list_contacts).post(handle_submit_contact),
        )
        .route("/api/contact/{id}/status", patch(handle_update_status))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ============ Error response ============

/// Error payload: `{"detail": "..."}` or `{"detail": [ {loc, msg, type}, ... ]}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: Detail,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Fields(Vec<FieldDetail>),
}

/// One offending input, located by where it came from (`body` or `query`)
/// and its field name.
#[derive(Debug, Serialize)]
struct FieldDetail {
    loc: Vec<String>,
    msg: String,
    #[serde(rename = "type")]
    kind: String,
}

impl FieldDetail {
    fn new(source: &str, err: FieldError) -> Self {
        Self {
            loc: vec![source.to_string(), err.field],
            msg: err.message,
            kind: err.kind.to_string(),
        }
    }
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    detail: Detail,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            detail: Detail::Message(message.into()),
        }
    }

    fn unprocessable(fields: Vec<FieldDetail>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: Detail::Fields(fields),
        }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        // Faults were already logged by the service with operation context.
        if !err.is_client_error() {
            return Self::internal();
        }
        match err {
            ServiceError::Validation(v) => Self::unprocessable(
                v.into_fields()
                    .into_iter()
                    .map(|f| FieldDetail::new("body", f))
                    .collect(),
            ),
            ServiceError::InvalidStatus(_) => Self::new(StatusCode::BAD_REQUEST, "Invalid status"),
            ServiceError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Message not found"),
            ServiceError::Persistence(_) | ServiceError::Store(_) => Self::internal(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::unprocessable(vec![FieldDetail {
                loc: vec!["body".to_string()],
                msg: e.body_text(),
                kind: "value_error".to_string(),
            }]),
            other => Self::new(other.status(), other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::unprocessable(vec![FieldDetail {
            loc: vec!["query".to_string()],
            msg: rejection.body_text(),
            kind: "value_error".to_string(),
        }])
    }
}

// ============ GET /health, GET /api/ ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Portfolio API is running".to_string(),
    })
}

// ============ /api/status ============

async fn handle_create_status_check(
    State(state): State<AppState>,
    body: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> Result<Json<StatusCheck>, AppError> {
    let Json(input) = body?;
    let check = state.status_checks.create(input).await?;
    Ok(Json(check))
}

async fn handle_list_status_checks(
    State(state): State<AppState>,
) -> Result<Json<Vec<StatusCheck>>, AppError> {
    Ok(Json(state.status_checks.list().await?))
}

// ============ /api/contact ============

/// Handler for `POST /api/contact`.
///
/// Missing fields and a malformed email are reported together as a 422
/// with one entry per offending field.
async fn handle_submit_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Json<ContactMessage>, AppError> {
    let Json(submission) = body?;
    let message = state.contacts.submit(submission).await?;
    Ok(Json(message))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
    status: Option<String>,
}

/// Handler for `GET /api/contact`.
///
/// `limit` defaults to `[contact].default_list_limit` and has no upper
/// bound. `status` is matched literally, so an unknown value returns `[]`.
async fn handle_list_contacts(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    let Query(params) = params?;
    let query = ListQuery {
        limit: params
            .limit
            .unwrap_or(state.config.contact.default_list_limit),
        status: params.status,
    };
    Ok(Json(state.contacts.list(&query).await?))
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    status: Option<String>,
}

/// Handler for `PATCH /api/contact/{id}/status`.
///
/// `status` is a required query parameter: absent is a 422, a value outside
/// the enumeration is a 400.
async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Query(params) = params?;
    let Some(status) = params.status else {
        return Err(AppError::unprocessable(vec![FieldDetail::new(
            "query",
            FieldError::missing("status"),
        )]));
    };
    state.contacts.update_status(&id, &status).await?;
    Ok(Json(MessageResponse {
        message: "Status updated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_core::error::ValidationErrors;
    use portfolio_core::models::ParseMessageStatusError;
    use serde_json::{json, Value};

    fn body(err: AppError) -> (StatusCode, Value) {
        let status = err.status;
        let body = serde_json::to_value(ErrorBody { detail: err.detail }).unwrap();
        (status, body)
    }

    #[test]
    fn test_validation_errors_list_field_locations() {
        let err: AppError = ServiceError::from(ValidationErrors::new(vec![
            FieldError::new("email", "value is not a valid email address"),
            FieldError::missing("subject"),
        ]))
        .into();
        let (status, body) = body(err);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"},
                {"loc": ["body", "subject"], "msg": "field required", "type": "missing"}
            ]})
        );
    }

    #[test]
    fn test_service_errors_map_to_detail_messages() {
        let (status, b) = body(ServiceError::from(ParseMessageStatusError("bogus".into())).into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(b, json!({"detail": "Invalid status"}));

        let (status, b) = body(ServiceError::NotFound { id: "x".into() }.into());
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(b, json!({"detail": "Message not found"}));

        let (status, b) = body(ServiceError::from(anyhow::anyhow!("disk I/O error at /var/db")).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(b, json!({"detail": "Internal server error"}));

        let (status, b) = body(ServiceError::Persistence("contact message").into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(b, json!({"detail": "Internal server error"}));
    }
}
