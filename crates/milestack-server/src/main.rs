use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use milestack_api::auth::{AppState, AppStateInner, AuthConfig};
use milestack_api::routes::router;
use milestack_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "milestack=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("MILESTACK_JWT_SECRET")
        .unwrap_or_else(|_| "change_this_secret_in_prod".into());
    let token_exp_hours: i64 = std::env::var("MILESTACK_JWT_EXP_HOURS")
        .unwrap_or_else(|_| "24".into())
        .parse()?;
    let host = std::env::var("MILESTACK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MILESTACK_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;
    let cors_origin = std::env::var("MILESTACK_CORS_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:9002".into());

    // Shared state: store lives as long as the process, nothing persists
    let state: AppState = Arc::new(AppStateInner {
        store: Store::new(),
        auth: AuthConfig {
            jwt_secret,
            token_exp_hours,
        },
    });

    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::AUTHORIZATION])
        .allow_credentials(true);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Milestack backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
