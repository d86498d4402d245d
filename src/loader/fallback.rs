//! Bundled reference templates used when the service is unavailable.

use include_dir::{Dir, include_dir};
use std::collections::BTreeMap;

use crate::error::CardstockError;
use crate::template::Project;

/// Reference templates embedded at compile time, one `<template-id>.json` each.
static BUNDLED_TEMPLATES: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Projects keyed by template identifier.
#[derive(Debug, Clone, Default)]
pub struct FallbackStore {
    templates: BTreeMap<String, Project>,
}

impl FallbackStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse every bundled template file.
    pub fn bundled() -> Result<Self, CardstockError> {
        let mut templates = BTreeMap::new();
        for file in BUNDLED_TEMPLATES.files() {
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let json = std::str::from_utf8(file.contents()).map_err(|e| {
                CardstockError::Shape(format!("bundled template {} is not UTF-8: {}", id, e))
            })?;
            let project = Project::from_json(json)?;
            templates.insert(id.to_string(), project);
        }
        Ok(Self { templates })
    }

    /// Add or replace a template (builder style).
    pub fn with(mut self, template_id: impl Into<String>, project: Project) -> Self {
        self.templates.insert(template_id.into(), project);
        self
    }

    pub fn get(&self, template_id: &str) -> Option<&Project> {
        self.templates.get(template_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_FRONT_TEMPLATE, DEFAULT_INSIDE_TEMPLATE};
    use crate::template::{ElementKind, Side};

    #[test]
    fn bundled_templates_parse() {
        let store = FallbackStore::bundled().unwrap();
        assert!(store.get(DEFAULT_FRONT_TEMPLATE).is_some());
        assert!(store.get(DEFAULT_INSIDE_TEMPLATE).is_some());
        assert!(store.len() >= 3);
    }

    #[test]
    fn bundled_page_references_resolve() {
        let store = FallbackStore::bundled().unwrap();
        for id in store.ids() {
            let project = store.get(id).unwrap();
            for page in project.pages.values() {
                for element_id in &page.objects_ids {
                    assert!(
                        project.objects.contains_key(element_id),
                        "{}: dangling {}",
                        id,
                        element_id
                    );
                }
            }
        }
    }

    #[test]
    fn bundled_front_uses_dynamic_cover() {
        let store = FallbackStore::bundled().unwrap();
        let front = store.get(DEFAULT_FRONT_TEMPLATE).unwrap();
        let dynamic = front.objects.values().any(|el| match &el.kind {
            ElementKind::Image(img) => img.metadata.contains_key(crate::compositor::DYNAMIC_SOURCE_KEY),
            ElementKind::Text(_) => false,
        });
        assert!(dynamic);
    }

    #[test]
    fn bundled_two_page_inside_uses_second_page() {
        let store = FallbackStore::bundled().unwrap();
        let spread = store.get("inside-spread").unwrap();
        assert_eq!(spread.page_key_for_side(Side::Inside), "page_1");
    }

    #[test]
    fn builder_overrides_bundled_entry() {
        let bundled = FallbackStore::bundled().unwrap();
        let inside = bundled.get(DEFAULT_INSIDE_TEMPLATE).unwrap().clone();
        let store = bundled.with(DEFAULT_FRONT_TEMPLATE, inside.clone());
        assert_eq!(store.get(DEFAULT_FRONT_TEMPLATE), Some(&inside));
    }
}
