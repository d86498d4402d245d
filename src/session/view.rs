//! Serializable snapshots of session state for the editor API.

use serde::Serialize;

use super::EditorSession;
use crate::loader::TemplateSource;
use crate::template::{Element, Side};

/// Summary of one side for the editor header and status indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideView {
    pub template_id: String,
    pub name: String,
    pub source: TemplateSource,
    pub page_key: String,
}

/// What the editor surface needs to draw its panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub article_number: String,
    pub token: String,
    pub active_side: Side,
    pub project_name: String,
    pub show_bleed: bool,
    pub selected: Option<String>,
    pub selected_element: Option<Element>,
    pub front: SideView,
    pub inside: SideView,
    /// True when either side is showing a bundled template.
    pub offline: bool,
}

/// Answer to a save request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub persisted: bool,
    pub message: String,
}

impl SessionView {
    pub(super) fn of(session: &EditorSession) -> Self {
        let side_view = |side: Side| {
            let loaded = session.template(side);
            SideView {
                template_id: loaded.template_id.clone(),
                name: loaded.project.name.clone(),
                source: loaded.source.clone(),
                page_key: loaded.project.page_key_for_side(side).to_string(),
            }
        };
        let front = side_view(Side::Front);
        let inside = side_view(Side::Inside);
        let offline = session.template(Side::Front).is_fallback() || session.template(Side::Inside).is_fallback();

        Self {
            article_number: session.params.article_number.clone(),
            token: session.params.token.clone(),
            active_side: session.active_side,
            project_name: session.active_project().name.clone(),
            show_bleed: session.show_bleed,
            selected: session.selected.clone(),
            selected_element: session.selected_element().cloned(),
            front,
            inside,
            offline,
        }
    }
}
