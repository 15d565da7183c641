//! HTTP Handlers

use std::path::PathBuf;
use std::sync::Arc;

use auth::middleware::{CurrentSession, RequireSession};
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::domain::catalog::Catalog;
use crate::infra::cdn::{CdnNode, CdnRoot};
use crate::presentation::dto::{CdnListing, HomeQuery, HomeResponse, ServicesResponse};

/// Shared state for directory handlers
#[derive(Clone)]
pub struct DirectoryAppState {
    pub catalog: Arc<Catalog>,
    pub cdn: Arc<CdnRoot>,
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /services
pub async fn services(
    State(state): State<DirectoryAppState>,
    RequireSession(session): RequireSession,
) -> Json<ServicesResponse> {
    let groups = session.groups();

    Json(ServicesResponse {
        featured: state.catalog.featured(groups).into_iter().cloned().collect(),
        categories: state
            .catalog
            .by_category(groups)
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

/// GET /
pub async fn home(
    State(state): State<DirectoryAppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<HomeQuery>,
) -> Json<HomeResponse> {
    // Only the codes the login flow emits are echoed
    let error = match query.error.as_deref() {
        Some("auth_failed") => Some("auth_failed"),
        Some("missing_pkce") => Some("missing_pkce"),
        Some(_) => Some("unknown"),
        None => None,
    };

    let response = match session {
        Some(session) => HomeResponse {
            authenticated: true,
            featured: state
                .catalog
                .featured(session.groups())
                .into_iter()
                .cloned()
                .collect(),
            user: Some(session.user().clone()),
            error,
        },
        None => HomeResponse {
            authenticated: false,
            user: None,
            // Even open services are for signed-in users only
            featured: Vec::new(),
            error,
        },
    };

    Json(response)
}

// ============================================================================
// CDN
// ============================================================================

/// GET /api/cdn
pub async fn cdn_root(State(state): State<DirectoryAppState>, req: Request) -> Response {
    serve(&state.cdn, "", req).await
}

/// GET /api/cdn/{*path}
pub async fn cdn_path(
    State(state): State<DirectoryAppState>,
    Path(path): Path<String>,
    req: Request,
) -> Response {
    serve(&state.cdn, &path, req).await
}

async fn serve(cdn: &CdnRoot, path: &str, req: Request) -> Response {
    match cdn.open(path).await {
        Ok(CdnNode::Directory(items)) => Json(CdnListing { items }).into_response(),
        Ok(CdnNode::File(file)) => serve_file(file, req).await,
        Err(e) => e.into_response(),
    }
}

/// Stream the file with its guessed MIME type, for display in the browser
async fn serve_file(file: PathBuf, req: Request) -> Response {
    let disposition = file
        .file_name()
        .map(|name| name.to_string_lossy().replace(['"', '\\'], "_"))
        .and_then(|name| HeaderValue::from_str(&format!("inline; filename=\"{name}\"")).ok())
        .unwrap_or_else(|| HeaderValue::from_static("inline"));

    let response = match ServeFile::new(&file).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let mut response = response.map(Body::new);
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }
    response
}
