//! Template data model: projects, pages and positioned elements.
//!
//! All types derive `Serialize + Deserialize` and use the camelCase field
//! names emitted by the design-tool export, so the same types are used for
//! the service payload, the bundled fallbacks and the editor API.
//!
//! ## Example
//!
//! ```
//! use cardstock::template::{ElementKind, Project};
//!
//! let json = r#"{
//!     "name": "Birthday",
//!     "pages": { "page_0": { "width": 420, "height": 595, "objectsIds": ["t1"] } },
//!     "objects": {
//!         "t1": { "type": "text", "top": 10, "left": 20, "width": 200, "height": 40,
//!                 "content": "Happy\nBirthday", "fontSize": 18, "fontFamily": "Futura\tBold" }
//!     }
//! }"#;
//!
//! let project = Project::from_json(json).unwrap();
//! let el = project.element("t1").unwrap();
//! assert_eq!(el.id, "t1");
//! match &el.kind {
//!     ElementKind::Text(text) => assert_eq!(text.font_family, "Futura Bold"),
//!     ElementKind::Image(_) => unreachable!(),
//! }
//! ```

mod font;

pub use font::normalize_font_family;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CardstockError;

/// Page key used when nothing else applies.
pub const FIRST_PAGE: &str = "page_0";

/// Page key holding the inside spread of a combined two-page document.
pub const INSIDE_PAGE: &str = "page_1";

/// Layer tag marking background, non-interactive elements.
pub const LAYER_BACKGROUND: &str = "unten";

/// Layer tag marking editable foreground elements.
pub const LAYER_EDITABLE: &str = "bearbeitung";

fn default_active_page() -> String {
    FIRST_PAGE.to_string()
}

/// One physical surface of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Inside,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Inside => "inside",
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Front => Side::Inside,
            Side::Inside => Side::Front,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Side::Front),
            "inside" => Ok(Side::Inside),
            other => Err(format!("unknown side '{}' (expected front or inside)", other)),
        }
    }
}

/// A template document describing one side of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active_page")]
    pub active_page: String,
    pub pages: BTreeMap<String, Page>,
    /// Flat mapping from element id to element.
    #[serde(default)]
    pub objects: BTreeMap<String, Element>,
}

/// One print surface with physical dimensions (points) and paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub width: f64,
    pub height: f64,
    /// Element ids in base paint order (later entries on top).
    #[serde(default)]
    pub objects_ids: Vec<String>,
    #[serde(default)]
    pub boxes: PageBoxes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageBoxes {
    #[serde(default)]
    pub trimbox: Trimbox,
}

/// Insets from the page edge to the trim line. Visual guide only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Trimbox {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

/// Layer tag of an element.
///
/// Only `unten` has special meaning (background, never selectable); every
/// other tag paints and behaves as foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Layer {
    Background,
    Editable,
    Other(String),
}

impl From<String> for Layer {
    fn from(s: String) -> Self {
        match s.as_str() {
            LAYER_BACKGROUND => Layer::Background,
            LAYER_EDITABLE => Layer::Editable,
            _ => Layer::Other(s),
        }
    }
}

impl From<Layer> for String {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Background => LAYER_BACKGROUND.to_string(),
            Layer::Editable => LAYER_EDITABLE.to_string(),
            Layer::Other(s) => s,
        }
    }
}

/// Horizontal text alignment. Unknown values read as `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl From<String> for TextAlign {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" => TextAlign::Center,
            "right" => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// A positioned text or image block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Backfilled from the mapping key when the export omits it.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<f64>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Discriminated element payload, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextContent),
    Image(ImageContent),
}

fn default_font_size() -> f64 {
    12.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// Literal content; `\n` line breaks are authoritative.
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_family: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    #[serde(default)]
    pub linked_file_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_transform: Option<ContentTransform>,
}

/// Inner placement of image content relative to the element's outer box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTransform {
    #[serde(default)]
    pub top_offset: f64,
    #[serde(default)]
    pub left_offset: f64,
    pub content_width: f64,
    pub content_height: f64,
}

impl Element {
    /// Background elements paint but can never be selected.
    pub fn is_background(&self) -> bool {
        matches!(self.layer, Some(Layer::Background))
    }

    pub fn as_text(&self) -> Option<&TextContent> {
        match &self.kind {
            ElementKind::Text(text) => Some(text),
            ElementKind::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageContent> {
        match &self.kind {
            ElementKind::Image(image) => Some(image),
            ElementKind::Text(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
        }
    }
}

impl Project {
    /// Parse a bare project payload and normalize it.
    pub fn from_json(json: &str) -> Result<Self, CardstockError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Deserialize a project from an already-parsed JSON value and normalize it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CardstockError> {
        let mut project: Project = serde_json::from_value(value)?;
        project.normalize()?;
        Ok(project)
    }

    /// Bring a freshly deserialized project into the shape the render path
    /// assumes: ids backfilled, font names cleaned, sizes finite and
    /// non-negative, and a first page present.
    pub fn normalize(&mut self) -> Result<(), CardstockError> {
        if !self.pages.contains_key(FIRST_PAGE) {
            return Err(CardstockError::Shape(format!(
                "project '{}' has no {}",
                self.name, FIRST_PAGE
            )));
        }
        if self.active_page.is_empty() || !self.pages.contains_key(&self.active_page) {
            self.active_page = default_active_page();
        }

        for (key, page) in &self.pages {
            if !page.width.is_finite() || !page.height.is_finite() {
                return Err(CardstockError::Shape(format!(
                    "page '{}' has non-finite dimensions",
                    key
                )));
            }
        }

        for (key, element) in self.objects.iter_mut() {
            if element.id.is_empty() {
                element.id = key.clone();
            }
            let geometry = [element.top, element.left, element.width, element.height];
            if geometry.iter().any(|v| !v.is_finite()) {
                return Err(CardstockError::Shape(format!(
                    "element '{}' has non-finite geometry",
                    key
                )));
            }
            if element.width < 0.0 || element.height < 0.0 {
                log::warn!(
                    "[template] element '{}' has negative size {}x{}, clamping to zero",
                    key,
                    element.width,
                    element.height
                );
                element.width = element.width.max(0.0);
                element.height = element.height.max(0.0);
            }
            if let ElementKind::Text(text) = &mut element.kind {
                text.font_family = normalize_font_family(&text.font_family);
            }
        }
        Ok(())
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.objects.get(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.objects.get_mut(id)
    }

    /// Page key representing `side` in this project.
    ///
    /// A combined document carries the inside spread as `page_1`; a document
    /// loaded for a single side only has `page_0`.
    pub fn page_key_for_side(&self, side: Side) -> &'static str {
        if side == Side::Inside && self.pages.contains_key(INSIDE_PAGE) {
            INSIDE_PAGE
        } else {
            FIRST_PAGE
        }
    }

    pub fn page_for_side(&self, side: Side) -> Option<(&'static str, &Page)> {
        let key = self.page_key_for_side(side);
        self.pages.get(key).map(|page| (key, page))
    }
}
