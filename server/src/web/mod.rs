use axum::Router;
use axum::http::{HeaderValue, Method, header};
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::task::api::{TaskState, create_task_router};

/// Starts the web server: binds the listener, opens the database connection,
/// applies migrations, serves until interrupted, and closes the connection on
/// shutdown.
#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let db = Arc::new(db);
    let task_state = Arc::new(TaskState { db: db.clone() });

    let app = Router::new()
        .merge(create_task_router(task_state))
        .route("/health", axum::routing::get(health_check_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config)?),
        );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close_by_ref().await?;
    tracing::info!("Database connection closed");
    Ok(())
}

/// Builds the cross-origin policy: only the configured frontend origin may
/// call the API, restricted to the four CRUD methods and the Content-Type
/// header.
fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = config.frontend_url.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(frontend_url: &str) -> Config {
        Config {
            db_url: "postgres://localhost/tasks".to_string(),
            port: 3010,
            frontend_url: frontend_url.to_string(),
        }
    }

    #[test]
    fn can_build_cors_layer_from_valid_origin() {
        let config = test_config("http://localhost:5173");
        assert!(cors_layer(&config).is_ok());
    }

    #[test]
    fn rejects_origin_that_is_not_a_valid_header_value() {
        let config = test_config("http://localhost\n5173");
        assert!(cors_layer(&config).is_err());
    }
}
