//! HTTP client for the template service.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::EditorConfig;
use crate::error::CardstockError;
use crate::template::Project;

/// Source of live template data.
#[async_trait]
pub trait TemplateService: Send + Sync {
    /// Fetch and validate the project for `template_id`.
    async fn fetch(&self, template_id: &str) -> Result<Project, CardstockError>;
}

/// Template service reached over HTTP GET.
///
/// Request shape: `GET {service_url}?{template_param}={template_id}`.
pub struct HttpTemplateService {
    client: reqwest::Client,
    service_url: String,
    template_param: String,
}

impl HttpTemplateService {
    pub fn new(config: &EditorConfig) -> Result<Self, CardstockError> {
        let client = reqwest::Client::builder()
            .user_agent("cardstock/0.1")
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CardstockError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            service_url: config.service_url.clone(),
            template_param: config.template_param.clone(),
        })
    }
}

#[async_trait]
impl TemplateService for HttpTemplateService {
    async fn fetch(&self, template_id: &str) -> Result<Project, CardstockError> {
        log::info!(
            "[loader] requesting '{}' from {}",
            template_id,
            self.service_url
        );

        let response = self
            .client
            .get(&self.service_url)
            .query(&[(self.template_param.as_str(), template_id)])
            .send()
            .await
            .map_err(|e| classify(template_id, e))?;

        let status = response.status();
        log::debug!("[loader] service status {} for '{}'", status, template_id);
        if !status.is_success() {
            return Err(CardstockError::Status {
                template_id: template_id.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify(template_id, e))?;
        parse_service_body(&bytes)
    }
}

fn classify(template_id: &str, e: reqwest::Error) -> CardstockError {
    if e.is_timeout() {
        CardstockError::Timeout(template_id.to_string())
    } else {
        CardstockError::Transport(format!("request for '{}' failed: {}", template_id, e))
    }
}

/// Extract the project from a service response body.
///
/// The service answers with either a record or a list wrapping one record;
/// the project lives at `canvas_data.project`. Some database exports store
/// `canvas_data` as a JSON string, which is decoded as well.
pub fn parse_service_body(body: &[u8]) -> Result<Project, CardstockError> {
    let value: Value = serde_json::from_slice(body)?;

    let record = match value {
        Value::Array(mut items) => {
            if items.is_empty() {
                return Err(CardstockError::Shape("empty result list".to_string()));
            }
            if items.len() > 1 {
                log::debug!("[loader] response list has {} records, using the first", items.len());
            }
            items.swap_remove(0)
        }
        other => other,
    };

    let canvas_data = match record.get("canvas_data") {
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)?,
        Some(Value::Null) | None => {
            return Err(CardstockError::Shape("missing canvas_data".to_string()));
        }
        Some(other) => other.clone(),
    };

    let project = canvas_data
        .get("project")
        .filter(|p| p.is_object())
        .cloned()
        .ok_or_else(|| CardstockError::Shape("missing canvas_data.project".to_string()))?;

    Project::from_value(project)
}
