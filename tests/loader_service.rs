//! # Template Service Tests
//!
//! Runs the HTTP loader against a local stand-in for the template service
//! and checks that every failure mode ends in the bundled template.

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cardstock::{
    CardstockError, EditorConfig, TemplateLoader,
    loader::{FallbackStore, HttpTemplateService, TemplateSource},
    template::Project,
};

fn project_json(name: &str) -> Value {
    json!({
        "name": name,
        "pages": {
            "page_0": { "width": 315, "height": 437, "objectsIds": ["t"] }
        },
        "objects": {
            "t": { "type": "text", "top": 10, "left": 10, "width": 100, "height": 20, "content": name }
        }
    })
}

async fn template_service(Query(params): Query<HashMap<String, String>>) -> Response {
    let Some(id) = params.get("artNr") else {
        return (StatusCode::BAD_REQUEST, "missing artNr").into_response();
    };
    match id.as_str() {
        "live" => Json(json!({ "canvas_data": { "project": project_json("Live") } })).into_response(),
        "wrapped" => Json(json!([{ "canvas_data": { "project": project_json("Wrapped") } }])).into_response(),
        "stringly" => {
            let canvas = json!({ "project": project_json("Stringly") }).to_string();
            Json(json!({ "canvas_data": canvas })).into_response()
        }
        "29009-front" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "inside-classic" => Json(json!({ "canvas_data": {} })).into_response(),
        "inside-spread" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "canvas_data": { "project": project_json("Too late") } })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown template").into_response(),
    }
}

/// Start the stand-in service and return its URL.
async fn spawn_service() -> String {
    let app = Router::new().route("/get-template", get(template_service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/get-template", addr)
}

fn config(service_url: String) -> EditorConfig {
    EditorConfig {
        service_url,
        request_timeout: Duration::from_millis(300),
        ..EditorConfig::default()
    }
}

async fn loader() -> TemplateLoader {
    TemplateLoader::from_config(&config(spawn_service().await)).unwrap()
}

fn bundled(id: &str) -> Project {
    FallbackStore::bundled().unwrap().get(id).unwrap().clone()
}

fn reason(source: &TemplateSource) -> &str {
    match source {
        TemplateSource::Fallback { reason } => reason,
        TemplateSource::Live => panic!("expected a fallback source"),
    }
}

#[tokio::test]
async fn live_template_is_used() {
    let loaded = loader().await.load("live").await.unwrap();
    assert_eq!(loaded.source, TemplateSource::Live);
    assert_eq!(loaded.project.name, "Live");
    assert_eq!(loaded.project.element("t").unwrap().id, "t");
}

#[tokio::test]
async fn list_wrapped_and_string_payloads_are_unwrapped() {
    let loader = loader().await;
    assert_eq!(loader.load("wrapped").await.unwrap().project.name, "Wrapped");
    assert_eq!(loader.load("stringly").await.unwrap().project.name, "Stringly");
}

#[tokio::test]
async fn server_error_falls_back_to_bundled_copy() {
    let loaded = loader().await.load("29009-front").await.unwrap();
    assert_eq!(loaded.project, bundled("29009-front"));
    assert!(reason(&loaded.source).contains("500"));
}

#[tokio::test]
async fn missing_project_falls_back() {
    let loaded = loader().await.load("inside-classic").await.unwrap();
    assert_eq!(loaded.project, bundled("inside-classic"));
    assert!(reason(&loaded.source).contains("canvas_data"));
}

#[tokio::test]
async fn non_json_body_falls_back() {
    let loaded = loader().await.load("inside-spread").await.unwrap();
    assert_eq!(loaded.project, bundled("inside-spread"));
}

#[tokio::test]
async fn unreachable_service_falls_back() {
    // Nothing listens on the discard port.
    let loader = TemplateLoader::from_config(&config("http://127.0.0.1:9/get-template".to_string())).unwrap();
    let loaded = loader.load("29009-front").await.unwrap();
    assert!(loaded.is_fallback());
    assert_eq!(loaded.project, bundled("29009-front"));
}

#[tokio::test]
async fn slow_service_times_out_to_fallback() {
    let cfg = config(spawn_service().await);
    let fallbacks = FallbackStore::bundled()
        .unwrap()
        .with("slow", Project::from_value(project_json("Bundled slow")).unwrap());
    let loader = TemplateLoader::new(Arc::new(HttpTemplateService::new(&cfg).unwrap()), fallbacks);

    let loaded = loader.load("slow").await.unwrap();
    assert_eq!(loaded.project.name, "Bundled slow");
    assert!(reason(&loaded.source).contains("timed out"));
}

#[tokio::test]
async fn unknown_template_without_bundle_is_an_error() {
    let err = loader().await.load("does-not-exist").await.unwrap_err();
    assert!(matches!(
        err,
        CardstockError::NoTemplate { ref template_id } if template_id == "does-not-exist"
    ));
}
