//! Portal Server Entry Point
//!
//! Loads settings, builds the OIDC client and mounts the auth and directory
//! routers behind the route guard. Uses `anyhow` for startup errors;
//! request-level errors go through `kernel::error::AppError`.

mod settings;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::middleware::{RouteGuard, route_guard};
use auth::{OidcClient, auth_router};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use directory::{Catalog, CdnRoot, directory_router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "portal=info,auth=info,directory=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    // Discovery happens on first use, so an unreachable provider does not
    // keep the portal from starting
    let provider = Arc::new(OidcClient::new(Arc::new(settings.oidc.clone()))?);
    tracing::info!(
        issuer = %settings.oidc.issuer,
        client_id = %settings.oidc.client_id,
        confidential = settings.oidc.client_secret.is_some(),
        "OIDC client configured"
    );

    let auth_config = Arc::new(settings.auth.clone());
    tracing::info!(
        protected = ?auth_config.protected_routes,
        secure_cookies = auth_config.cookie_secure,
        cdn_root = %settings.directory.cdn_root.display(),
        "Route guard configured"
    );

    let mut app = Router::new()
        .nest("/api/auth", auth_router(provider, auth_config.clone()))
        .merge(directory_router(
            Catalog::portal(),
            CdnRoot::new(&settings.directory.cdn_root),
        ))
        .layer(from_fn_with_state(RouteGuard::new(auth_config), route_guard))
        .layer(TraceLayer::new_for_http());

    if !settings.frontend_origins.is_empty() {
        app = app.layer(cors(&settings.frontend_origins));
    }

    // Start server
    let addr = settings.bind_addr;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Credentialed CORS for a frontend served from another origin
fn cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}
