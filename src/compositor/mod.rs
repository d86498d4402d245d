//! Canvas compositing: turns a project and an active side into a render list.
//!
//! The compositor is a pure function of (project, side, article number,
//! viewport). It selects the page that represents the side, resolves the
//! page's element ids (dropping and reporting dangling ones), orders them
//! for painting and computes screen geometry for every element.
//!
//! ## Paint order
//!
//! Background elements (`layer = "unten"`) paint first and never take part
//! in selection. Within each group the order key is `zIndex`, or the
//! element's position in `objectsIds` when it has none; ties keep list order.

mod source;
mod text;

pub use source::{DYNAMIC_SOURCE_KEY, ImageSources};
pub use text::{LINE_HEIGHT, TEXT_PADDING, TextLayout, TextLine};

use serde::Serialize;

use crate::config::EditorConfig;
use crate::error::CardstockError;
use crate::template::{ContentTransform, Element, ElementKind, Page, Project, Side, Trimbox};

/// Preview zoom used by the editor surface.
pub const DEFAULT_SCALE: f64 = 1.2;

/// Uniform zoom and the screen position of the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub origin_top: f64,
    pub origin_left: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::scaled(DEFAULT_SCALE)
    }
}

impl Viewport {
    /// Viewport with the page at the screen origin.
    pub fn scaled(scale: f64) -> Self {
        Self {
            scale,
            origin_top: 0.0,
            origin_left: 0.0,
        }
    }

    /// Map a page-space box to screen space.
    pub fn project(&self, top: f64, left: f64, width: f64, height: f64) -> ScreenBox {
        ScreenBox {
            top: self.origin_top + top * self.scale,
            left: self.origin_left + left * self.scale,
            width: width * self.scale,
            height: height * self.scale,
        }
    }
}

/// Axis-aligned box in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenBox {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

/// The page surface and its trim guide in screen units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFrame {
    pub key: String,
    pub screen: ScreenBox,
    /// Trim insets scaled to screen units.
    pub trimbox: Trimbox,
}

/// How image content fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Fill the box, cropping to keep the aspect ratio.
    Cover,
    /// Placed exactly as given by the element's content transform.
    Exact,
}

/// Screen-space layout of an image element, relative to its box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageLayout {
    pub src: String,
    pub file_name: String,
    pub dynamic: bool,
    pub fit: ImageFit,
    /// Content rectangle relative to the element's box; may overflow it.
    pub placement: ScreenBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderContent {
    Text(TextLayout),
    Image(ImageLayout),
}

/// One element ready to paint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderItem {
    pub id: String,
    pub screen: ScreenBox,
    /// False for background elements, which never become selected.
    pub interactive: bool,
    pub locked: bool,
    pub content: RenderContent,
}

/// The ordered render list for one side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub side: Side,
    pub scale: f64,
    pub page: PageFrame,
    /// Paint order, bottom first.
    pub items: Vec<RenderItem>,
    /// Ids listed on the page that have no element; omitted from `items`.
    pub dangling: Vec<String>,
}

impl Composition {
    pub fn item(&self, id: &str) -> Option<&RenderItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Topmost interactive element under a screen point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&RenderItem> {
        self.items
            .iter()
            .rev()
            .find(|item| item.interactive && item.screen.contains(x, y))
    }

    /// Every image URL the render list references.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match &item.content {
            RenderContent::Image(image) => Some(image.src.as_str()),
            RenderContent::Text(_) => None,
        })
    }
}

/// Builds render lists for projects.
#[derive(Debug, Clone)]
pub struct Compositor {
    sources: ImageSources,
}

impl Compositor {
    pub fn new(config: &EditorConfig) -> Result<Self, CardstockError> {
        Ok(Self {
            sources: ImageSources::new(config)?,
        })
    }

    pub fn sources(&self) -> &ImageSources {
        &self.sources
    }

    /// Derive the render list for `side` of `project`.
    pub fn compose(
        &self,
        project: &Project,
        side: Side,
        article_number: &str,
        viewport: Viewport,
    ) -> Result<Composition, CardstockError> {
        let (page_key, page) = project.page_for_side(side).ok_or_else(|| {
            CardstockError::Shape(format!("project '{}' has no page for {}", project.name, side.label()))
        })?;

        let (ordered, dangling) = paint_order(project, page);
        if !dangling.is_empty() {
            log::warn!(
                "[compositor] {} dangling element reference(s) on {} of '{}': {:?}",
                dangling.len(),
                page_key,
                project.name,
                dangling
            );
        }

        let items = ordered
            .into_iter()
            .map(|element| self.render_item(element, article_number, viewport))
            .collect();

        Ok(Composition {
            side,
            scale: viewport.scale,
            page: page_frame(page_key, page, viewport),
            items,
            dangling,
        })
    }

    fn render_item(&self, element: &Element, article_number: &str, viewport: Viewport) -> RenderItem {
        let screen = viewport.project(element.top, element.left, element.width, element.height);
        let content = match &element.kind {
            ElementKind::Text(text) => RenderContent::Text(TextLayout::new(
                text,
                element.text_align,
                screen.width,
                screen.height,
                viewport.scale,
            )),
            ElementKind::Image(image) => {
                let (fit, placement) = image_placement(image.content_transform, &screen, viewport.scale);
                RenderContent::Image(ImageLayout {
                    src: self.sources.resolve(article_number, image),
                    file_name: image.linked_file_name.clone(),
                    dynamic: ImageSources::is_dynamic(image),
                    fit,
                    placement,
                })
            }
        };
        RenderItem {
            id: element.id.clone(),
            screen,
            interactive: !element.is_background(),
            locked: element.is_locked,
            content,
        }
    }
}

/// Resolve a page's element ids and sort them for painting.
///
/// Returns the ordered elements and the ids that did not resolve.
pub fn paint_order<'a>(project: &'a Project, page: &Page) -> (Vec<&'a Element>, Vec<String>) {
    let mut dangling = Vec::new();
    let mut resolved: Vec<(usize, &Element)> = Vec::with_capacity(page.objects_ids.len());
    for (index, id) in page.objects_ids.iter().enumerate() {
        match project.element(id) {
            Some(element) => resolved.push((index, element)),
            None => dangling.push(id.clone()),
        }
    }

    resolved.sort_by(|(ia, a), (ib, b)| {
        let group = b.is_background().cmp(&a.is_background());
        group
            .then_with(|| order_key(a, *ia).total_cmp(&order_key(b, *ib)))
            .then_with(|| ia.cmp(ib))
    });

    (resolved.into_iter().map(|(_, el)| el).collect(), dangling)
}

fn order_key(element: &Element, index: usize) -> f64 {
    element.z_index.unwrap_or(index as f64)
}

fn image_placement(
    transform: Option<ContentTransform>,
    screen: &ScreenBox,
    scale: f64,
) -> (ImageFit, ScreenBox) {
    match transform {
        Some(t) => (
            ImageFit::Exact,
            ScreenBox {
                top: t.top_offset * scale,
                left: t.left_offset * scale,
                width: t.content_width * scale,
                height: t.content_height * scale,
            },
        ),
        None => (
            ImageFit::Cover,
            ScreenBox {
                top: 0.0,
                left: 0.0,
                width: screen.width,
                height: screen.height,
            },
        ),
    }
}

fn page_frame(key: &str, page: &Page, viewport: Viewport) -> PageFrame {
    let trim = page.boxes.trimbox;
    PageFrame {
        key: key.to_string(),
        screen: viewport.project(0.0, 0.0, page.width, page.height),
        trimbox: Trimbox {
            top: trim.top * viewport.scale,
            right: trim.right * viewport.scale,
            bottom: trim.bottom * viewport.scale,
            left: trim.left * viewport.scale,
        },
    }
}
