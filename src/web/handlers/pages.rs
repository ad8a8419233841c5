// Page handlers for HTML rendering with Askama

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
};
use askama::Template;
use serde::Deserialize;

use super::{today, with_session_cookie};
use crate::api_server::{AppError, AppState};
use crate::session::SessionState;
use crate::web::view_models::{DcatView, FlashView, PanelView, SavedView, SearchView};

// ============================================================================
// Home Page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub title: String,
    pub intro_html: String,
    pub explainer_html: String,
    pub flashes: Vec<FlashView>,
    pub dcat: DcatView,
    pub search: SearchView,
    pub panel: PanelView,
    pub saved: Option<SavedView>,
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    /// OPC UA search term
    pub q: Option<String>,
}

pub async fn home_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HomeQuery>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    if let Some(term) = query.q {
        guard.search_term = term.trim().to_string();
    }

    let hits = state.search_index.search(&state.data.hierarchy, &guard.search_term);
    let template = HomeTemplate {
        title: "RoX Semantic Model UI".to_string(),
        intro_html: state.intro_html.to_string(),
        explainer_html: state.explainer_html.to_string(),
        flashes: guard.take_flashes().into_iter().map(FlashView::from).collect(),
        dcat: DcatView::build(&guard.draft, today()),
        search: SearchView::build(&guard.search_term, hits),
        panel: panel_view(&state, &guard),
        saved: guard.last_saved.as_ref().map(SavedView::from),
    };
    drop(guard);

    let body = Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }));
    with_session_cookie(&session, body)
}

// ============================================================================
// OPC UA Panel Fragment (htmx)
// ============================================================================

#[derive(Template)]
#[template(path = "partials/opcua_panel.html")]
pub struct OpcuaPanelTemplate {
    pub panel: PanelView,
}

pub async fn opcua_panel(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let guard = session.state.lock().await;
    let template = OpcuaPanelTemplate { panel: panel_view(&state, &guard) };
    drop(guard);

    with_session_cookie(&session, render_panel(template))
}

pub(crate) fn panel_view(state: &AppState, session: &SessionState) -> PanelView {
    PanelView::build(&state.data, session.selection.as_ref(), &session.opcua_values)
}

pub(crate) fn render_panel(template: OpcuaPanelTemplate) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }))
}

// ============================================================================
// Download
// ============================================================================

pub async fn download_asset(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let json = state.store.read(&filename)?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&filename)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        json,
    )
        .into_response())
}
