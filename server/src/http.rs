use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use entity::Employee;
use platform_api::{ApiError, ApiResult};
use platform_store::EmployeeStore;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, instrument};

use crate::{
    binding::{self, BoundParams, FieldSpec, Parse, Source},
    config::AppConfig,
};

pub const WELCOME: &str = "Welcome to the Employee Directory API.";
const CREATED_TEXT: &str = "Employee added successfully.";
const UPDATED_TEXT: &str = "Employee updated successfully.";
const DELETED_TEXT: &str = "Employee is deleted successfully.";

// Binding tables, one per route that reads inputs outside the request body.

const EMPLOYEE_PROFILE: &[FieldSpec] = &[
    FieldSpec {
        field: "id",
        source: Source::Route,
        key: "id",
        required: true,
        parse: Parse::Integer,
    },
    FieldSpec {
        field: "name",
        source: Source::Query,
        key: "name",
        required: false,
        parse: Parse::Text,
    },
    FieldSpec {
        field: "position",
        source: Source::Header,
        key: "Position",
        required: false,
        parse: Parse::Text,
    },
];

const EMPLOYEE_BY_IDENTITY: &[FieldSpec] = &[FieldSpec {
    field: "id",
    source: Source::Header,
    key: "identity",
    required: true,
    parse: Parse::Integer,
}];

const EMPLOYEE_DELETE: &[FieldSpec] = &[FieldSpec {
    field: "id",
    source: Source::Route,
    key: "id",
    required: true,
    parse: Parse::Integer,
}];

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EmployeeStore>,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/", get(welcome_handler))
        .route("/health", get(health_handler))
        .route(
            "/employees",
            get(employee_by_identity_handler)
                .post(create_employee_handler)
                .put(update_employee_handler),
        )
        .route(
            "/employees/{id}",
            get(employee_profile_handler).delete(delete_employee_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn welcome_handler() -> &'static str {
    WELCOME
}

/// Looks up an employee by path id and writes the bound `name` query value
/// and `Position` header value back onto the stored record before returning
/// it. The write-back on read is deliberate; it is what this route is for.
#[instrument(name = "http.employee_profile", skip_all)]
async fn employee_profile_handler(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<Json<Employee>> {
    let params = binding::bind(EMPLOYEE_PROFILE, &path, &query, &headers)?;
    let id = required_id(&params)?;
    let employee = state
        .store
        .amend_profile(id, params.text("name"), params.text("position"))
        .ok_or(ApiError::NotFound)?;
    Ok(Json(employee))
}

/// Alternate lookup: the id arrives in the `identity` header instead of the
/// path.
#[instrument(name = "http.employee_by_identity", skip_all)]
async fn employee_by_identity_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Employee>> {
    let params = binding::bind(
        EMPLOYEE_BY_IDENTITY,
        &HashMap::new(),
        &HashMap::new(),
        &headers,
    )?;
    let id = required_id(&params)?;
    let employee = state.store.get(id).ok_or(ApiError::NotFound)?;
    Ok(Json(employee))
}

#[instrument(name = "http.create_employee", skip_all)]
async fn create_employee_handler(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<(StatusCode, &'static str)> {
    let employee = parse_employee(&body)?;
    if !employee.has_valid_id() {
        return Err(ApiError::InvalidInput(String::new()));
    }
    state.store.add(employee);
    Ok((StatusCode::CREATED, CREATED_TEXT))
}

#[instrument(name = "http.update_employee", skip_all)]
async fn update_employee_handler(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<&'static str> {
    let employee = parse_employee(&body)?;
    if state.store.update(&employee) {
        Ok(UPDATED_TEXT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[instrument(name = "http.delete_employee", skip_all)]
async fn delete_employee_handler(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<&'static str> {
    let params = binding::bind(EMPLOYEE_DELETE, &path, &HashMap::new(), &headers)?;
    let id = required_id(&params)?;
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if token != state.config.admin_token {
        return Err(ApiError::Unauthorized);
    }
    if state.store.delete(id) {
        Ok(DELETED_TEXT)
    } else {
        Err(ApiError::NotFound)
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        employees: state.store.len(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    employees: usize,
    version: &'static str,
}

fn parse_employee(body: &str) -> ApiResult<Employee> {
    serde_json::from_str(body)
        .map_err(|err| ApiError::InvalidInput(format!("invalid employee payload: {err}")))
}

// Every table above declares `id`; absence here is a programming error, not a
// client one.
fn required_id(params: &BoundParams) -> ApiResult<i64> {
    params
        .integer("id")
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("binding table is missing `id`")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> (Router, Arc<EmployeeStore>) {
        let store = Arc::new(EmployeeStore::seeded());
        let config = Arc::new(AppConfig {
            admin_token: "frank".into(),
            cors_allowed_origins: Vec::new(),
        });
        let router = build_router(AppState {
            store: store.clone(),
            config,
        });
        (router, store)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_serves_the_welcome_text() {
        let (router, _) = test_router();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WELCOME);
    }

    #[tokio::test]
    async fn profile_route_rejects_non_integer_ids() {
        let (router, _) = test_router();
        let request = Request::builder()
            .uri("/employees/seven")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("not a valid integer"));
    }

    #[tokio::test]
    async fn identity_route_requires_the_header() {
        let (router, _) = test_router();
        let request = Request::builder()
            .uri("/employees")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "missing required header `identity`");
    }

    #[tokio::test]
    async fn malformed_post_bodies_get_a_diagnostic() {
        let (router, store) = test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/employees")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("invalid employee payload"));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn health_reports_collection_size() {
        let (router, _) = test_router();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["ok"], serde_json::json!(true));
        assert_eq!(value["employees"], serde_json::json!(3));
    }
}
