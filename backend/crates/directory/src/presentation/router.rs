//! Directory Router

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::domain::catalog::Catalog;
use crate::infra::cdn::CdnRoot;
use crate::presentation::handlers::{self, DirectoryAppState};

/// Home, service catalog and CDN routes.
///
/// Expects the auth route guard around the application; `/services` answers
/// 401 without a session even if the guard does not protect it.
pub fn directory_router(catalog: Catalog, cdn: CdnRoot) -> Router {
    let state = DirectoryAppState {
        catalog: Arc::new(catalog),
        cdn: Arc::new(cdn),
    };

    Router::new()
        .route("/", get(handlers::home))
        .route("/services", get(handlers::services))
        .route("/api/cdn", get(handlers::cdn_root))
        .route("/api/cdn/", get(handlers::cdn_root))
        .route("/api/cdn/{*path}", get(handlers::cdn_path))
        .with_state(state)
}
