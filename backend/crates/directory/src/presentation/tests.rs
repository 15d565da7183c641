//! Router tests behind the auth route guard

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use auth::domain::codec::SessionCodec;
use auth::domain::session::{Session, SessionDraft, SessionUser};
use auth::middleware::{RouteGuard, route_guard};
use auth::AuthConfig;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::router::directory_router;
use crate::domain::catalog::Catalog;
use crate::infra::cdn::CdnRoot;

fn app(cdn_root: &Path) -> Router {
    let config = Arc::new(AuthConfig::development());
    directory_router(Catalog::portal(), CdnRoot::new(cdn_root))
        .layer(from_fn_with_state(RouteGuard::new(config), route_guard))
}

fn session_cookie(groups: &[&str]) -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let session = Session::new(
        SessionDraft {
            access_token: "access".into(),
            refresh_token: None,
            id_token: "h.p.s".into(),
            expires_at: now + 60_000,
            user: SessionUser {
                sub: "user-1".into(),
                email: None,
                name: Some("Ada".into()),
            },
            groups: groups.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
        },
        now,
    )
    .unwrap();
    cookie::Cookie::new("session", SessionCodec::encode(&session).unwrap())
        .encoded()
        .to_string()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn names(services: &Value) -> Vec<&str> {
    services
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_services_filtered_by_groups() {
    let dir = tempfile::tempdir().unwrap();
    let cookie = session_cookie(&["disaster_prep"]);
    let response = app(dir.path())
        .oneshot(get("/services", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        names(&body["featured"]),
        vec!["Jellyfin", "Komga", "PinePods", "Romm", "PocketID"]
    );

    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["category"], "Disasters / Emergencies");
    assert_eq!(names(&categories[0]["services"]), vec!["Kiwix", "Pairdrop", "Traccar"]);
    assert_eq!(categories[1]["category"], "Productivity");
    assert_eq!(names(&categories[1]["services"]), vec!["Pairdrop"]);
}

#[tokio::test]
async fn test_services_requires_session() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(get("/services", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_home() {
    let dir = tempfile::tempdir().unwrap();

    let response = app(dir.path())
        .oneshot(get("/?error=auth_failed", None))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        json!({"authenticated": false, "featured": [], "error": "auth_failed"})
    );

    let response = app(dir.path())
        .oneshot(get("/?error=%3Cscript%3E", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["error"], "unknown");

    let cookie = session_cookie(&["immich"]);
    let response = app(dir.path()).oneshot(get("/", Some(&cookie))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"], json!({"sub": "user-1", "name": "Ada"}));
    assert!(names(&body["featured"]).contains(&"Immich"));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_cdn_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();

    for uri in ["/api/cdn", "/api/cdn/"] {
        let response = app(dir.path()).oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "docs");
        assert_eq!(items[0]["type"], "directory");
        assert_eq!(items[0]["size"], Value::Null);
        assert_eq!(items[1]["name"], "readme.txt");
        assert_eq!(items[1]["type"], "file");
        assert_eq!(items[1]["size"], 5);
        assert_eq!(items[1]["path"], "readme.txt");
    }
}

#[tokio::test]
async fn test_cdn_serves_file_inline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/notes.txt"), b"field notes").unwrap();

    let response = app(dir.path())
        .oneshot(get("/api/cdn/docs/notes.txt", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"notes.txt\""
    );
    assert_eq!(body_bytes(response).await, b"field notes");
}

#[tokio::test]
async fn test_cdn_traversal_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("public");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();

    let response = app(&root)
        .oneshot(get("/api/cdn/%2E%2E/secret.txt", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({"error": "Access denied"}));
}

#[tokio::test]
async fn test_cdn_missing() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(get("/api/cdn/missing.png", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not found"}));
}
