pub mod config;
pub mod db;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::MembershipConfig;
use crate::gateway::Gateway;
use crate::services::{ApprovalService, EmailProvider, LoginService};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::access::submit_access_request,
        handlers::auth::login,
        handlers::auth::send_code,
        handlers::auth::verify_code,
        handlers::auth::change_password,
        handlers::admin::list_pending_requests,
        handlers::admin::approve_request,
        handlers::admin::reject_request,
        handlers::admin::create_group,
    ),
    components(
        schemas(
            handlers::ErrorResponse,
            handlers::access::SubmitAccessRequest,
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::SendCodeRequest,
            handlers::auth::SendCodeResponse,
            handlers::auth::VerifyCodeRequest,
            handlers::auth::VerifyCodeResponse,
            handlers::auth::ChangePasswordRequest,
            handlers::admin::CreateGroupRequest,
            services::ApprovalOutcome,
            models::AccessRequestResponse,
            models::GroupResponse,
            models::UserResponse,
            models::Session,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "access", description = "Access request submission"),
        (name = "auth", description = "Login and two-factor verification"),
        (name = "admin", description = "Request review and group management"),
        (name = "observability", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-admin-api-key"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: MembershipConfig,
    pub gateway: Arc<dyn Gateway>,
    pub email: Arc<dyn EmailProvider>,
    pub approval: ApprovalService,
    pub login: LoginService,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route(
            "/admin/access-requests",
            get(handlers::admin::list_pending_requests),
        )
        .route(
            "/admin/access-requests/:request_id/approve",
            post(handlers::admin::approve_request),
        )
        .route(
            "/admin/access-requests/:request_id/reject",
            post(handlers::admin::reject_request),
        )
        .route("/admin/groups", post(handlers::admin::create_group))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::admin_auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<axum::http::HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<axum::http::HeaderValue>>(),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::HeaderName::from_static("x-admin-api-key"),
        ]);

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/auth/access-requests",
            post(handlers::access::submit_access_request),
        )
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/otp/send", post(handlers::auth::send_code))
        .route("/auth/otp/verify", post(handlers::auth::verify_code))
        .route(
            "/auth/password/change",
            post(handlers::auth::change_password),
        )
        .merge(admin_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(cors);

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.gateway.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::DatabaseError(anyhow::Error::new(e))
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up"
        }
    })))
}
