//! Editor session API handlers.
//!
//! Every mutating route answers with the updated [`SessionView`] so the
//! frontend can redraw its panels from a single response.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    compositor::{Composition, DEFAULT_SCALE, Viewport},
    config::StartupParams,
    error::CardstockError,
    loader::TemplateSource,
    session::{EditorSession, SaveReceipt, SessionView, SwapOutcome},
    svg::{SvgOptions, render_svg},
    template::Side,
};

use super::super::state::{AppState, StoredSession};

type ApiError = (StatusCode, String);

fn default_scale() -> f64 {
    DEFAULT_SCALE
}

fn default_true() -> bool {
    true
}

/// Query parameters for render and preview endpoints.
#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Check image assets and paint placeholders for missing ones.
    #[serde(default = "default_true")]
    pub probe: bool,
}

impl ViewQuery {
    fn viewport(&self) -> Result<Viewport, ApiError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Invalid scale: {}", self.scale),
            ));
        }
        Ok(Viewport::scaled(self.scale))
    }
}

/// Response from the create endpoint.
#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub id: String,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub id: String,
}

/// Click position in preview pixels at the given scale.
#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

#[derive(Debug, Deserialize)]
pub struct SideRequest {
    pub side: Side,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub template_id: String,
}

#[derive(Debug, Serialize)]
pub struct SwapResponse {
    pub applied: bool,
    pub source: Option<TemplateSource>,
    pub session: SessionView,
}

fn api_error(e: CardstockError) -> ApiError {
    let status = match &e {
        CardstockError::NoTemplate { .. } | CardstockError::UnknownElement(_) => StatusCode::NOT_FOUND,
        CardstockError::NotText(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn not_found(id: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

/// Run `f` against the stored session `id`, refreshing its access time.
async fn with_session<R>(
    state: &AppState,
    id: &str,
    f: impl FnOnce(&mut EditorSession) -> R,
) -> Result<R, ApiError> {
    let mut sessions = state.sessions.write().await;
    let stored = sessions.get_mut(id).ok_or_else(|| not_found(id))?;
    stored.touch();
    Ok(f(&mut stored.session))
}

/// POST /api/sessions - start a session from the host's query parameters.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartupParams>,
) -> Result<Json<CreatedSession>, ApiError> {
    let session = EditorSession::start(&state.loader, params)
        .await
        .map_err(api_error)?;
    let id = Uuid::new_v4().to_string();
    let view = session.view();
    log::info!(
        "[sessions] created {} for article {} ({} / {})",
        id,
        view.article_number,
        view.front.template_id,
        view.inside.template_id
    );
    state
        .sessions
        .write()
        .await
        .insert(id.clone(), StoredSession::new(session));
    Ok(Json(CreatedSession { id, session: view }))
}

/// GET /api/sessions/:id
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| Json(s.view())).await
}

/// GET /api/sessions/:id/render - render list of the active side as JSON.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Composition>, ApiError> {
    let viewport = query.viewport()?;
    let composition = with_session(&state, &id, |s| s.compose(&state.compositor, viewport))
        .await?
        .map_err(api_error)?;
    Ok(Json(composition))
}

/// GET /api/sessions/:id/preview.svg - SVG preview of the active side.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewport = query.viewport()?;
    let (composition, selected, show_bleed) = with_session(&state, &id, |s| {
        s.compose(&state.compositor, viewport)
            .map(|c| (c, s.selected().map(str::to_string), s.show_bleed()))
    })
    .await?
    .map_err(api_error)?;

    // Probe outside the session lock; downloads may take a while.
    let report = if query.probe {
        state.assets.probe_composition(&composition).await
    } else {
        Default::default()
    };

    let svg = render_svg(
        &composition,
        &SvgOptions {
            show_bleed,
            selected: selected.as_deref(),
            assets: &report,
        },
    );
    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        svg,
    ))
}

/// POST /api/sessions/:id/selection - select an element by id.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| {
        s.select(&req.id);
        Json(s.view())
    })
    .await
}

/// DELETE /api/sessions/:id/selection
pub async fn clear_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| {
        s.clear_selection();
        Json(s.view())
    })
    .await
}

/// POST /api/sessions/:id/click - select the topmost interactive element at a point.
///
/// Clicks that hit only background or empty page leave the selection as is.
pub async fn click(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ClickRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let viewport = ViewQuery {
        scale: req.scale,
        probe: false,
    }
    .viewport()?;
    with_session(&state, &id, |s| -> Result<_, CardstockError> {
        let composition = s.compose(&state.compositor, viewport)?;
        if let Some(item) = composition.hit_test(req.x, req.y) {
            s.select(&item.id);
        }
        Ok(Json(s.view()))
    })
    .await?
    .map_err(api_error)
}

/// POST /api/sessions/:id/side
pub async fn set_side(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SideRequest>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| {
        s.set_active_side(req.side);
        Json(s.view())
    })
    .await
}

/// POST /api/sessions/:id/bleed - toggle the bleed guide.
pub async fn toggle_bleed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| {
        s.toggle_bleed();
        Json(s.view())
    })
    .await
}

/// POST /api/sessions/:id/elements/:element/text
pub async fn update_text(
    State(state): State<Arc<AppState>>,
    Path((id, element)): Path<(String, String)>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| -> Result<_, CardstockError> {
        s.update_text(&element, req.content)?;
        Ok(Json(s.view()))
    })
    .await?
    .map_err(api_error)
}

/// POST /api/sessions/:id/elements/:element/lock
pub async fn toggle_lock(
    State(state): State<Arc<AppState>>,
    Path((id, element)): Path<(String, String)>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, &id, |s| -> Result<_, CardstockError> {
        s.toggle_lock(&element)?;
        Ok(Json(s.view()))
    })
    .await?
    .map_err(api_error)
}

/// POST /api/sessions/:id/inside-layout - replace the inside layout.
///
/// The session lock is released while the template loads; a swap started
/// later wins even if its response arrives first.
pub async fn swap_inside_layout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<SwapResponse>, ApiError> {
    let (ticket, cached) = with_session(&state, &id, |s| {
        let ticket = s.begin_inside_swap(&req.template_id);
        let cached = s.cached_layout(&ticket.template_id);
        (ticket, cached)
    })
    .await?;

    let result = match cached {
        Some(loaded) => Ok(loaded),
        None => state.loader.load(&ticket.template_id).await,
    };

    with_session(&state, &id, |s| -> Result<_, CardstockError> {
        let outcome = s.finish_inside_swap(ticket, result)?;
        let (applied, source) = match outcome {
            SwapOutcome::Applied { source } => (true, Some(source)),
            SwapOutcome::Superseded => (false, None),
        };
        Ok(Json(SwapResponse {
            applied,
            source,
            session: s.view(),
        }))
    })
    .await?
    .map_err(api_error)
}

/// POST /api/sessions/:id/save - placeholder; nothing is persisted.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt: SaveReceipt = with_session(&state, &id, |s| s.save()).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}
