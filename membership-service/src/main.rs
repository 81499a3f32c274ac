use membership_service::{
    build_router,
    config::MembershipConfig,
    gateway::PostgresGateway,
    services::{ApprovalService, LoginService, SmtpEmailService},
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration, fail fast if invalid
    let config = MembershipConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting membership service"
    );

    let pool = membership_service::db::create_pool(&config.database)
        .await
        .map_err(|e| {
            service_core::error::AppError::DatabaseError(anyhow::anyhow!(
                "Failed to connect to PostgreSQL: {}",
                e
            ))
        })?;

    membership_service::db::run_migrations(&pool).await.map_err(|e| {
        service_core::error::AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e))
    })?;

    let gateway = Arc::new(PostgresGateway::new(pool));
    tracing::info!("Persistence gateway initialized");

    let email = Arc::new(SmtpEmailService::new(&config.mail)?);
    tracing::info!("Email service initialized");

    let approval = ApprovalService::new(gateway.clone());
    let login = LoginService::new(
        gateway.clone(),
        email.clone(),
        config.two_factor.code_ttl_minutes,
        config.two_factor.resend_cooldown_seconds,
    );

    let state = AppState {
        config: config.clone(),
        gateway,
        email,
        approval,
        login,
    };

    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
