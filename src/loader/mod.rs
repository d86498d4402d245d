//! Template loading with a bundled fallback.
//!
//! `TemplateLoader` asks a [`TemplateService`] for a project. Every kind of
//! fetch failure (transport, timeout, non-2xx status, malformed body) is
//! recovered by substituting the bundled reference template for the same
//! identifier. Only when no bundled template exists does the caller see
//! [`CardstockError::NoTemplate`].

mod fallback;
mod http;

pub use fallback::FallbackStore;
pub use http::{HttpTemplateService, TemplateService, parse_service_body};

use serde::Serialize;
use std::sync::Arc;

use crate::config::EditorConfig;
use crate::error::CardstockError;
use crate::template::Project;

/// Where a loaded project came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TemplateSource {
    /// Fetched from the template service.
    Live,
    /// Bundled reference template; `reason` says why the live fetch was skipped.
    Fallback { reason: String },
}

/// A project together with the identifier it was loaded for and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTemplate {
    pub template_id: String,
    pub project: Project,
    pub source: TemplateSource,
}

impl LoadedTemplate {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, TemplateSource::Fallback { .. })
    }
}

/// Resolves template identifiers to projects, live or bundled.
#[derive(Clone)]
pub struct TemplateLoader {
    service: Arc<dyn TemplateService>,
    fallbacks: Arc<FallbackStore>,
}

impl TemplateLoader {
    pub fn new(service: Arc<dyn TemplateService>, fallbacks: FallbackStore) -> Self {
        Self {
            service,
            fallbacks: Arc::new(fallbacks),
        }
    }

    /// Loader backed by the HTTP service in `config` and the bundled templates.
    pub fn from_config(config: &EditorConfig) -> Result<Self, CardstockError> {
        let service = HttpTemplateService::new(config)?;
        Ok(Self::new(Arc::new(service), FallbackStore::bundled()?))
    }

    pub fn fallbacks(&self) -> &FallbackStore {
        &self.fallbacks
    }

    /// Load `template_id`, falling back to the bundled copy on any fetch failure.
    pub async fn load(&self, template_id: &str) -> Result<LoadedTemplate, CardstockError> {
        let template_id = template_id.trim();
        if template_id.is_empty() {
            return Err(CardstockError::NoTemplate {
                template_id: String::new(),
            });
        }

        let failure = match self.service.fetch(template_id).await {
            Ok(project) => {
                log::info!(
                    "[loader] loaded '{}' from service ({} elements)",
                    template_id,
                    project.objects.len()
                );
                return Ok(LoadedTemplate {
                    template_id: template_id.to_string(),
                    project,
                    source: TemplateSource::Live,
                });
            }
            Err(e) if e.is_recoverable_fetch() => e,
            Err(e) => return Err(e),
        };

        match self.fallbacks.get(template_id) {
            Some(project) => {
                log::warn!(
                    "[loader] using bundled template for '{}': {}",
                    template_id,
                    failure
                );
                Ok(LoadedTemplate {
                    template_id: template_id.to_string(),
                    project: project.clone(),
                    source: TemplateSource::Fallback {
                        reason: failure.to_string(),
                    },
                })
            }
            None => {
                log::error!(
                    "[loader] no template available for '{}': {}",
                    template_id,
                    failure
                );
                Err(CardstockError::NoTemplate {
                    template_id: template_id.to_string(),
                })
            }
        }
    }
}
