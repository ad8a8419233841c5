// Form action handlers
//
// Every action updates the visitor's session, queues a flash message and
// redirects back to the page. Level selection answers htmx requests with the
// re-rendered OPC UA panel instead.

use axum::{
    extract::{Form, State},
    http::HeaderMap,
    response::{Redirect, Response},
};
use axum_htmx::HxRequest;
use serde::Deserialize;
use std::collections::HashMap;

use super::pages::{panel_view, render_panel, OpcuaPanelTemplate};
use super::{today, with_session_cookie};
use crate::api_server::{save_in_background, AppState};
use crate::asset::{AssetDescription, DcatForm, OpcuaValue, ValidationError, MANDATORY_FIELDS_MESSAGE};
use crate::hierarchy::Selection;
use crate::session::FlashKind;

/// `POST /dcat`: check the mandatory DCAT fields and keep the draft
pub async fn save_dcat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<DcatForm>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    match form.asset_type().and_then(|_| form.validate(today())) {
        Ok(_) => guard.flash(FlashKind::Success, "DCAT information saved successfully!"),
        Err(e) => guard.flash(FlashKind::Error, e.to_string()),
    }
    guard.draft = form;
    drop(guard);

    with_session_cookie(&session, Redirect::to("/"))
}

/// `POST /opcua/select`: object type and `level_<n>` fields
///
/// Changing the object type discards the level choices made for the
/// previous one.
pub async fn select_levels(
    State(state): State<AppState>,
    headers: HeaderMap,
    HxRequest(is_htmx): HxRequest,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    let object_type = fields.get("object_type").cloned().unwrap_or_default();
    let type_changed = fields
        .get("previous_object_type")
        .is_some_and(|previous| *previous != object_type);

    let levels = if type_changed {
        Vec::new()
    } else {
        (1..)
            .map_while(|n| fields.get(&format!("level_{}", n)).cloned())
            .collect()
    };

    let requested = Selection::new(object_type, levels);
    guard.selection = state.data.hierarchy.normalize(Some(&requested));
    tracing::debug!("Selection is now {:?}", guard.selection);

    if is_htmx {
        let template = OpcuaPanelTemplate { panel: panel_view(&state, &guard) };
        drop(guard);
        return with_session_cookie(&session, render_panel(template));
    }
    drop(guard);

    with_session_cookie(&session, Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct ApplyHitForm {
    #[serde(default)]
    pub q: String,
    pub index: usize,
}

/// `POST /opcua/search/apply`: preset the drill-down from a search result
pub async fn apply_search_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ApplyHitForm>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    let hits = state.search_index.search(&state.data.hierarchy, &form.q);
    match hits.get(form.index) {
        Some(hit) => {
            let selection = state.data.hierarchy.normalize(Some(&hit.selection()));
            if let Some(selection) = &selection {
                guard.flash(FlashKind::Info, format!("Selected path: {}", selection.display_path()));
            }
            guard.selection = selection;
            guard.search_term = form.q;
        }
        None => guard.flash(FlashKind::Warning, "That search result is no longer available."),
    }
    drop(guard);

    with_session_cookie(&session, Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct ValueForm {
    #[serde(default)]
    pub value: String,
}

/// `POST /opcua/values`: attach a value to the selected node
pub async fn add_value(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ValueForm>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    let table = &state.data.hierarchy;
    let selection = table
        .normalize(guard.selection.as_ref())
        .filter(Selection::has_choice);
    let node = selection
        .as_ref()
        .and_then(|s| table.resolve_node(&s.object_type, &s.levels));

    let result = match (&selection, node) {
        (Some(selection), Some(node)) => {
            OpcuaValue::for_node(node, &form.value).map(|value| (selection.path_key(), value))
        }
        _ => Err(ValidationError::NoNodeSelected),
    };

    match result {
        Ok((path_key, value)) => {
            guard.flash(FlashKind::Success, format!("Value added for {}", path_key));
            guard.opcua_values.insert(path_key, value);
        }
        Err(ValidationError::EmptyValue) => {
            guard.flash(FlashKind::Warning, ValidationError::EmptyValue.to_string());
        }
        Err(e) => guard.flash(FlashKind::Error, e.to_string()),
    }
    drop(guard);

    with_session_cookie(&session, Redirect::to("/"))
}

/// `POST /opcua/values/clear`
pub async fn clear_values(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    guard.opcua_values.clear();
    guard.flash(FlashKind::Info, "Cleared all OPC UA values.");
    drop(guard);

    with_session_cookie(&session, Redirect::to("/"))
}

/// `POST /assets/save`: validate everything and write the JSON file
pub async fn save_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<DcatForm>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    let mut guard = session.state.lock().await;

    let built = AssetDescription::from_form(&form, guard.opcua_values.clone(), today());
    guard.draft = form;
    let asset = match built {
        Ok(asset) => asset,
        Err(e) => {
            match e {
                ValidationError::MissingRequired => guard.flash(FlashKind::Error, MANDATORY_FIELDS_MESSAGE),
                e => guard.flash(FlashKind::Error, e.to_string()),
            }
            drop(guard);
            return with_session_cookie(&session, Redirect::to("/"));
        }
    };
    drop(guard);

    let result = save_in_background(state.store.clone(), asset).await;

    let mut guard = session.state.lock().await;
    match result {
        Ok(saved) => {
            guard.flash(
                FlashKind::Success,
                format!("Asset description saved successfully to {}", saved.filename),
            );
            guard.last_saved = Some(saved);
        }
        Err(e) => {
            tracing::error!("Failed to save asset description: {}", e);
            guard.flash(FlashKind::Error, format!("Error saving asset description: {}", e));
        }
    }
    drop(guard);

    with_session_cookie(&session, Redirect::to("/"))
}
