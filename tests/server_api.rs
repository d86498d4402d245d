//! # Editor API Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`. The
//! template service is always down, so every session runs on the bundled
//! templates.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use cardstock::{
    CardstockError, EditorConfig, TemplateLoader,
    loader::{FallbackStore, TemplateService},
    server::{AppState, router},
    template::Project,
};

struct Offline;

#[async_trait]
impl TemplateService for Offline {
    async fn fetch(&self, template_id: &str) -> Result<Project, CardstockError> {
        Err(CardstockError::Transport(format!("offline, cannot fetch '{}'", template_id)))
    }
}

fn app() -> Router {
    app_with(EditorConfig::default())
}

fn app_with(config: EditorConfig) -> Router {
    let loader = TemplateLoader::new(Arc::new(Offline), FallbackStore::bundled().unwrap());
    let state = AppState::with_loader(config, loader).unwrap();
    router(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Create a session with default parameters and return its id.
async fn create(app: &Router) -> String {
    let (status, body) = send_json(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_session_reads_host_parameters() {
    let app = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/sessions?artNr=31415&front=29009-front&inside=inside-spread&token=abc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session = &body["session"];
    assert_eq!(session["article_number"], json!("31415"));
    assert_eq!(session["token"], json!("abc"));
    assert_eq!(session["inside"]["template_id"], json!("inside-spread"));
    assert_eq!(session["inside"]["page_key"], json!("page_1"));
    assert_eq!(session["offline"], json!(true));
    assert_eq!(session["front"]["source"]["kind"], json!("fallback"));
}

#[tokio::test]
async fn unknown_template_is_not_found() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/sessions?inside=nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().contains("nope"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = app();
    let (status, _) = send(&app, "GET", "/api/sessions/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preview_is_svg() {
    let app = app();
    let id = create(&app).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/sessions/{}/preview.svg?probe=false", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    let svg = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"data-id="headline""#));
    assert!(svg.contains(r#"class="bleed""#));
}

#[tokio::test]
async fn unreachable_assets_get_placeholders_by_default() {
    // Nothing listens on the discard port.
    let app = app_with(EditorConfig {
        fronts_base_url: "http://127.0.0.1:9/fronts".to_string(),
        assets_base_url: "http://127.0.0.1:9/assets".to_string(),
        ..EditorConfig::default()
    });
    let id = create(&app).await;
    let (status, body) = send(&app, "GET", &format!("/api/sessions/{}/preview.svg", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let svg = String::from_utf8(body).unwrap();
    assert!(svg.contains(r#"class="missing-asset""#));
    assert!(svg.contains("missing: banner_gold.png"));
    assert!(!svg.contains("<image"));
}

#[tokio::test]
async fn invalid_scale_is_rejected() {
    let app = app();
    let id = create(&app).await;
    let (status, _) = send(&app, "GET", &format!("/api/sessions/{}/render?scale=0", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn click_selects_topmost_and_ignores_background() {
    let app = app();
    let id = create(&app).await;
    let click = format!("/api/sessions/{}/click", id);

    // Centre of the headline box at scale 1.2.
    let (status, view) = send_json(&app, "POST", &click, Some(json!({ "x": 180.0, "y": 414.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["selected"], json!("headline"));
    assert_eq!(view["selected_element"]["type"], json!("text"));

    // Only the background cover photo lies under this point.
    let (_, view) = send_json(&app, "POST", &click, Some(json!({ "x": 20.0, "y": 20.0 }))).await;
    assert_eq!(view["selected"], json!("headline"));
}

#[tokio::test]
async fn text_edit_and_lock_toggle() {
    let app = app();
    let id = create(&app).await;

    let (status, view) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/elements/headline/text", id),
        Some(json!({ "content": "Frohe\nWeihnachten" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["project_name"], json!("29009 Vorderseite"));

    let (_, render) = send_json(&app, "GET", &format!("/api/sessions/{}/render", id), None).await;
    let headline = render["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == json!("headline"))
        .unwrap();
    assert_eq!(headline["content"]["lines"][1]["text"], json!("Weihnachten"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/elements/frame/text", id),
        Some(json!({ "content": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let lock = format!("/api/sessions/{}/elements/headline/lock", id);
    send(&app, "POST", &format!("/api/sessions/{}/selection", id), Some(json!({ "id": "headline" }))).await;
    let (_, view) = send_json(&app, "POST", &lock, None).await;
    assert_eq!(view["selected_element"]["isLocked"], json!(true));

    let (status, _) = send(&app, "POST", &format!("/api/sessions/{}/elements/ghost/lock", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn side_switch_and_layout_swap() {
    let app = app();
    let id = create(&app).await;

    send(&app, "POST", &format!("/api/sessions/{}/selection", id), Some(json!({ "id": "headline" }))).await;
    let (_, view) = send_json(&app, "POST", &format!("/api/sessions/{}/side", id), Some(json!({ "side": "inside" }))).await;
    assert_eq!(view["active_side"], json!("inside"));
    assert_eq!(view["selected"], Value::Null);

    let (status, swap) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/inside-layout", id),
        Some(json!({ "template_id": "inside-spread" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(swap["applied"], json!(true));
    assert_eq!(swap["source"]["kind"], json!("fallback"));
    assert_eq!(swap["session"]["inside"]["page_key"], json!("page_1"));
}

#[tokio::test]
async fn bleed_toggle_and_save() {
    let app = app();
    let id = create(&app).await;

    let (_, view) = send_json(&app, "POST", &format!("/api/sessions/{}/bleed", id), None).await;
    assert_eq!(view["show_bleed"], json!(false));

    let (status, receipt) = send_json(&app, "POST", &format!("/api/sessions/{}/save", id), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(receipt["persisted"], json!(false));
}

#[tokio::test]
async fn bundled_templates_are_listed() {
    let app = app();
    let (status, list) = send_json(&app, "GET", "/api/templates/bundled", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["29009-front", "inside-classic", "inside-spread"]);
}

#[tokio::test]
async fn index_page_is_cache_busted() {
    let app = app();
    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/assets/editor.js?v="));

    let (status, _) = send(&app, "GET", "/assets/editor.js", None).await;
    assert_eq!(status, StatusCode::OK);
}
