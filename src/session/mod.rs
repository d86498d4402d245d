//! Editor session state.
//!
//! One `EditorSession` owns everything a user edits: the front and inside
//! projects, the active side, the current selection and the bleed toggle.
//! It is mutated only through the operations below, which keep these rules:
//!
//! - at most one element is selected, and it is listed on the page the
//!   active side renders
//! - text and lock edits address only elements of that page
//! - background (`unten`) elements never become selected
//! - switching side or swapping the inside layout clears the selection
//! - a text edit changes only the `content` of the addressed element
//! - a layout swap whose generation has been superseded is discarded

mod view;

pub use view::{SaveReceipt, SessionView, SideView};

use std::collections::HashMap;

use crate::compositor::{Composition, Compositor, Viewport};
use crate::config::StartupParams;
use crate::error::CardstockError;
use crate::loader::{LoadedTemplate, TemplateLoader, TemplateSource};
use crate::template::{Element, ElementKind, Project, Side};

/// Claim on the inside side taken when a layout swap starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTicket {
    pub template_id: String,
    generation: u64,
}

/// Result of completing a layout swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The inside side now shows the new layout.
    Applied { source: TemplateSource },
    /// A newer swap started meanwhile; this result was dropped.
    Superseded,
}

/// In-memory state of one editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    params: StartupParams,
    front: LoadedTemplate,
    inside: LoadedTemplate,
    active_side: Side,
    selected: Option<String>,
    show_bleed: bool,
    inside_generation: u64,
    /// Pristine live layouts by template id, for swapping back without a fetch.
    layout_cache: HashMap<String, LoadedTemplate>,
}

impl EditorSession {
    pub fn new(params: StartupParams, front: LoadedTemplate, inside: LoadedTemplate) -> Self {
        let mut session = Self {
            params,
            front,
            inside,
            active_side: Side::Front,
            selected: None,
            show_bleed: true,
            inside_generation: 0,
            layout_cache: HashMap::new(),
        };
        let inside = session.inside.clone();
        session.remember(&inside);
        session
    }

    /// Load both sides concurrently and build a session once both settled.
    ///
    /// Fails with [`CardstockError::NoTemplate`] if either side has neither
    /// live data nor a bundled fallback.
    pub async fn start(loader: &TemplateLoader, params: StartupParams) -> Result<Self, CardstockError> {
        let params = params.with_defaults();
        let (front, inside) = tokio::join!(
            loader.load(&params.front_template),
            loader.load(&params.inside_template)
        );
        Ok(Self::new(params, front?, inside?))
    }

    pub fn params(&self) -> &StartupParams {
        &self.params
    }

    pub fn article_number(&self) -> &str {
        &self.params.article_number
    }

    pub fn active_side(&self) -> Side {
        self.active_side
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn show_bleed(&self) -> bool {
        self.show_bleed
    }

    pub fn template(&self, side: Side) -> &LoadedTemplate {
        match side {
            Side::Front => &self.front,
            Side::Inside => &self.inside,
        }
    }

    pub fn project(&self, side: Side) -> &Project {
        &self.template(side).project
    }

    pub fn active_project(&self) -> &Project {
        self.project(self.active_side)
    }

    fn active_project_mut(&mut self) -> &mut Project {
        match self.active_side {
            Side::Front => &mut self.front.project,
            Side::Inside => &mut self.inside.project,
        }
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selected
            .as_deref()
            .and_then(|id| self.active_project().element(id))
    }

    /// Whether `id` is listed on the page the active side renders.
    pub fn is_on_active_page(&self, id: &str) -> bool {
        self.active_project()
            .page_for_side(self.active_side)
            .is_some_and(|(_, page)| page.objects_ids.iter().any(|listed| listed == id))
    }

    /// Element of the active page, for edit operations.
    fn active_element_mut(&mut self, id: &str) -> Result<&mut Element, CardstockError> {
        if !self.is_on_active_page(id) {
            return Err(CardstockError::UnknownElement(id.to_string()));
        }
        self.active_project_mut()
            .element_mut(id)
            .ok_or_else(|| CardstockError::UnknownElement(id.to_string()))
    }

    /// Switch the edited side. Changing side always drops the selection.
    pub fn set_active_side(&mut self, side: Side) {
        if side != self.active_side {
            self.active_side = side;
            self.selected = None;
        }
    }

    /// Select an element of the active side.
    ///
    /// Returns whether the selection changed to `id`. Unknown ids, elements
    /// of another page and background elements leave the selection untouched.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.is_on_active_page(id) {
            return false;
        }
        match self.active_project().element(id) {
            Some(element) if !element.is_background() => {
                self.selected = Some(id.to_string());
                true
            }
            Some(_) => {
                log::debug!("[session] ignoring selection of background element '{}'", id);
                false
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Replace the content of a text element on the active page.
    ///
    /// Every other field, including `isLocked`, is left as it was; the lock
    /// flag is advisory and does not block edits.
    pub fn update_text(&mut self, id: &str, content: impl Into<String>) -> Result<(), CardstockError> {
        let element = self.active_element_mut(id)?;
        match &mut element.kind {
            ElementKind::Text(text) => {
                text.content = content.into();
                Ok(())
            }
            ElementKind::Image(_) => Err(CardstockError::NotText(id.to_string())),
        }
    }

    /// Flip the lock flag of an element on the active page; returns the new value.
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool, CardstockError> {
        let element = self.active_element_mut(id)?;
        element.is_locked = !element.is_locked;
        Ok(element.is_locked)
    }

    /// Flip the bleed guide; returns the new value.
    pub fn toggle_bleed(&mut self) -> bool {
        self.show_bleed = !self.show_bleed;
        self.show_bleed
    }

    /// Start replacing the inside layout. Any earlier unfinished swap is
    /// superseded by this one.
    pub fn begin_inside_swap(&mut self, template_id: &str) -> SwapTicket {
        self.inside_generation += 1;
        SwapTicket {
            template_id: template_id.trim().to_string(),
            generation: self.inside_generation,
        }
    }

    pub fn is_current(&self, ticket: &SwapTicket) -> bool {
        ticket.generation == self.inside_generation
    }

    /// Pristine copy of a layout loaded live earlier in this session.
    pub fn cached_layout(&self, template_id: &str) -> Option<LoadedTemplate> {
        self.layout_cache.get(template_id.trim()).cloned()
    }

    /// Complete a swap with the loader's result.
    ///
    /// Superseded tickets are dropped whatever the result. For the current
    /// ticket a loaded template replaces the inside side wholesale and clears
    /// the selection; a load error leaves the session unchanged.
    pub fn finish_inside_swap(
        &mut self,
        ticket: SwapTicket,
        result: Result<LoadedTemplate, CardstockError>,
    ) -> Result<SwapOutcome, CardstockError> {
        if !self.is_current(&ticket) {
            log::info!(
                "[session] dropping superseded layout swap to '{}'",
                ticket.template_id
            );
            return Ok(SwapOutcome::Superseded);
        }
        let loaded = result?;
        self.remember(&loaded);
        let source = loaded.source.clone();
        self.inside = loaded;
        self.selected = None;
        Ok(SwapOutcome::Applied { source })
    }

    /// Load `template_id` and make it the inside layout.
    pub async fn swap_inside_layout(
        &mut self,
        loader: &TemplateLoader,
        template_id: &str,
    ) -> Result<SwapOutcome, CardstockError> {
        let ticket = self.begin_inside_swap(template_id);
        let result = match self.cached_layout(&ticket.template_id) {
            Some(cached) => Ok(cached),
            None => loader.load(&ticket.template_id).await,
        };
        self.finish_inside_swap(ticket, result)
    }

    fn remember(&mut self, loaded: &LoadedTemplate) {
        if loaded.source == TemplateSource::Live {
            self.layout_cache
                .insert(loaded.template_id.clone(), loaded.clone());
        }
    }

    /// Render list of the active side.
    pub fn compose(&self, compositor: &Compositor, viewport: Viewport) -> Result<Composition, CardstockError> {
        compositor.compose(
            self.active_project(),
            self.active_side,
            self.article_number(),
            viewport,
        )
    }

    /// Saving is not wired to any backend; nothing is persisted.
    pub fn save(&self) -> SaveReceipt {
        log::info!(
            "[session] save requested for article {} (front '{}', inside '{}'); nothing persisted",
            self.params.article_number,
            self.front.template_id,
            self.inside.template_id
        );
        SaveReceipt {
            persisted: false,
            message: "Saving is not available in this editor".to_string(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView::of(self)
    }
}
