//! Template catalogue handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::super::state::AppState;

#[derive(Debug, Serialize)]
pub struct BundledTemplate {
    pub id: String,
    pub name: String,
}

/// GET /api/templates/bundled - identifiers with a bundled fallback.
///
/// The editor offers these as inside layouts to swap to.
pub async fn bundled(State(state): State<Arc<AppState>>) -> Json<Vec<BundledTemplate>> {
    let fallbacks = state.loader.fallbacks();
    let list = fallbacks
        .ids()
        .filter_map(|id| {
            fallbacks.get(id).map(|project| BundledTemplate {
                id: id.to_string(),
                name: project.name.clone(),
            })
        })
        .collect();
    Json(list)
}
