//! Editor configuration and per-session startup parameters.
//!
//! `EditorConfig` carries every endpoint the editor talks to and is handed
//! to the loader, asset probe and compositor at construction time.
//! `StartupParams` are the values a hosting page passes in its query string.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default article shown when the hosting page passes none.
pub const DEFAULT_ARTICLE: &str = "29009";
/// Default front template identifier.
pub const DEFAULT_FRONT_TEMPLATE: &str = "29009-front";
/// Default inside template identifier.
pub const DEFAULT_INSIDE_TEMPLATE: &str = "inside-classic";

/// Endpoints and budgets for one editor deployment.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Template service endpoint (GET, template id passed as a query parameter).
    pub service_url: String,
    /// Name of the query parameter carrying the template id.
    pub template_param: String,
    /// Base URL for auto-derived front-cover photos (`{base}/{artNr}.{ext}`).
    pub fronts_base_url: String,
    /// Base URL for per-article assets (`{base}/{artNr}/{linkedFileName}`).
    pub assets_base_url: String,
    /// File extension of front-cover photos.
    pub front_image_extension: String,
    /// Upper bound for a single template request.
    pub request_timeout: Duration,
    /// Address the HTTP server listens on (e.g., "0.0.0.0:8080").
    pub listen_addr: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:5678/webhook/get-template".to_string(),
            template_param: "artNr".to_string(),
            fronts_base_url: "http://127.0.0.1:8080/media/fronts".to_string(),
            assets_base_url: "http://127.0.0.1:8080/media/assets".to_string(),
            front_image_extension: "jpg".to_string(),
            request_timeout: Duration::from_secs(8),
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

fn default_article() -> String {
    DEFAULT_ARTICLE.to_string()
}

fn default_front() -> String {
    DEFAULT_FRONT_TEMPLATE.to_string()
}

fn default_inside() -> String {
    DEFAULT_INSIDE_TEMPLATE.to_string()
}

/// Values that parameterise one editor session.
///
/// Field names follow the hosting page's query string
/// (`?artNr=29009&front=...&inside=...&token=...`). Every field has a
/// default so a session can start without a hosting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupParams {
    #[serde(rename = "artNr", default = "default_article")]
    pub article_number: String,
    #[serde(rename = "front", default = "default_front")]
    pub front_template: String,
    #[serde(rename = "inside", default = "default_inside")]
    pub inside_template: String,
    /// Opaque token forwarded for external bookkeeping; unused by the editor.
    #[serde(default)]
    pub token: String,
}

impl Default for StartupParams {
    fn default() -> Self {
        Self {
            article_number: default_article(),
            front_template: default_front(),
            inside_template: default_inside(),
            token: String::new(),
        }
    }
}

impl StartupParams {
    /// Replace blank values with defaults (a host may send `?artNr=`).
    pub fn with_defaults(mut self) -> Self {
        if self.article_number.trim().is_empty() {
            self.article_number = default_article();
        }
        if self.front_template.trim().is_empty() {
            self.front_template = default_front();
        }
        if self.inside_template.trim().is_empty() {
            self.inside_template = default_inside();
        }
        self
    }
}
