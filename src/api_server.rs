// Axum server module
//
// Purpose: serve the asset description form (HTML + htmx) and a JSON API
// over the same lookup tables and JSON store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

use crate::asset::{resolve_values, AssetDescription, DcatForm, OpcuaValues, ValidationError};
use crate::config::ServerConfig;
use crate::data::CatalogData;
use crate::hierarchy::Selection;
use crate::search_index::SearchIndex;
use crate::session::SessionStore;
use crate::store::{AssetStore, SavedAsset, StoreError};
use crate::web::explainer;
use crate::web::handlers::{forms, pages};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<CatalogData>,
    pub search_index: Arc<SearchIndex>,
    pub store: Arc<AssetStore>,
    pub sessions: SessionStore,
    /// Static page copy, rendered from markdown once
    pub intro_html: Arc<String>,
    pub explainer_html: Arc<String>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading lookup tables...");
        let data = CatalogData::load(&config.data_dir, &config.dcat_file, &config.opcua_file)?;

        tracing::info!("Output directory: {}", config.output_dir.display());
        let store = AssetStore::new(config.output_dir.clone());

        Ok(Self::from_parts(data, store, config.session_ttl))
    }

    pub fn from_parts(data: CatalogData, store: AssetStore, session_ttl: Duration) -> Self {
        let search_index = Arc::new(SearchIndex::build(&data.hierarchy));

        Self {
            data: Arc::new(data),
            search_index,
            store: Arc::new(store),
            sessions: SessionStore::new(session_ttl),
            intro_html: Arc::new(explainer::render_markdown(explainer::INTRO_MD)),
            explainer_html: Arc::new(explainer::render_markdown(explainer::OPCUA_EXPLAINER_MD)),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Form pages (HTML)
        .route("/", get(pages::home_page))
        .route("/opcua/panel", get(pages::opcua_panel))
        .route("/assets/:filename", get(pages::download_asset))

        // Form actions (POST, redirect back to the page or return an htmx fragment)
        .route("/dcat", post(forms::save_dcat))
        .route("/opcua/select", post(forms::select_levels))
        .route("/opcua/search/apply", post(forms::apply_search_hit))
        .route("/opcua/values", post(forms::add_value))
        .route("/opcua/values/clear", post(forms::clear_values))
        .route("/assets/save", post(forms::save_asset))

        // Lookup endpoints (JSON API)
        .route("/api/dcat/classes", get(list_dcat_classes))
        .route("/api/dcat/classes/:class/properties", get(get_dcat_properties))
        .route("/api/opcua/object-types", get(list_object_types))
        .route("/api/opcua/levels", get(get_level_values))
        .route("/api/opcua/options", post(get_next_level_options))
        .route("/api/opcua/resolve", post(resolve_node))
        .route("/api/opcua/search", get(search_nodes))

        // Submission endpoint (JSON API)
        .route("/api/assets", post(submit_asset))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "nodes": state.data.hierarchy.len(),
    }))
}

async fn list_dcat_classes(State(state): State<AppState>) -> Json<serde_json::Value> {
    let classes = state.data.properties.classes();
    Json(serde_json::json!({
        "rows": classes.len(),
        "data": classes,
    }))
}

async fn get_dcat_properties(
    State(state): State<AppState>,
    Path(class): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let properties = state.data.properties.properties(&class);
    if properties.is_empty() {
        return Err(AppError::NotFound(format!("Unknown DCAT class '{}'", class)));
    }

    Ok(Json(serde_json::json!({
        "class": class,
        "properties": properties,
    })))
}

async fn list_object_types(State(state): State<AppState>) -> Json<serde_json::Value> {
    let object_types = state.data.hierarchy.object_types();
    Json(serde_json::json!({
        "rows": object_types.len(),
        "data": object_types,
    }))
}

#[derive(Debug, Deserialize)]
struct LevelQuery {
    object_type: String,
    level: usize,
}

async fn get_level_values(
    State(state): State<AppState>,
    Query(query): Query<LevelQuery>,
) -> Json<serde_json::Value> {
    let values = state.data.hierarchy.level_values(&query.object_type, query.level);
    Json(serde_json::json!({
        "object_type": query.object_type,
        "level": query.level,
        "data": values,
    }))
}

async fn get_next_level_options(
    State(state): State<AppState>,
    Json(selection): Json<Selection>,
) -> Json<serde_json::Value> {
    let options = state
        .data
        .hierarchy
        .next_level_options(&selection.object_type, &selection.levels);

    Json(serde_json::json!({
        "level": selection.levels.len() + 1,
        "data": options,
    }))
}

async fn resolve_node(
    State(state): State<AppState>,
    Json(selection): Json<Selection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let node = state
        .data
        .hierarchy
        .resolve_node(&selection.object_type, &selection.levels)
        .ok_or_else(|| AppError::NotFound(format!("No node at '{}'", selection.display_path())))?;

    Ok(Json(serde_json::json!({
        "path": selection.path_key(),
        "display_path": selection.display_path(),
        "id": node.id,
        "type": node.node_type,
        "full_name": node.full_name,
        "input_label": node.kind().input_label(),
    })))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn search_nodes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<serde_json::Value> {
    let term = query.q.unwrap_or_default();
    let start = std::time::Instant::now();
    let hits = state.search_index.search(&state.data.hierarchy, &term);
    let elapsed = start.elapsed();

    Json(serde_json::json!({
        "query": term,
        "rows": hits.len(),
        "data": hits,
        "query_time_us": elapsed.as_micros(),
    }))
}

/// Body of `POST /api/assets`: the DCAT form fields plus OPC UA values
#[derive(Debug, Deserialize)]
pub struct AssetSubmission {
    #[serde(flatten)]
    pub form: DcatForm,
    #[serde(default)]
    pub opcua: OpcuaValues,
}

async fn submit_asset(
    State(state): State<AppState>,
    Json(submission): Json<AssetSubmission>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let today = chrono::Local::now().date_naive();
    let mut asset = AssetDescription::from_form(&submission.form, OpcuaValues::new(), today)?;
    asset.opcua = resolve_values(&state.data.hierarchy, submission.opcua)?;

    let saved = save_in_background(state.store.clone(), asset.clone())
        .await
        .map_err(|e| {
            tracing::error!("Failed to save asset description: {}", e);
            AppError::Internal(format!("Error saving asset description: {}", e))
        })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "filename": saved.filename,
            "asset": asset,
        })),
    ))
}

/// File I/O: run in blocking thread pool
pub(crate) async fn save_in_background(
    store: Arc<AssetStore>,
    asset: AssetDescription,
) -> anyhow::Result<SavedAsset> {
    let saved = tokio::task::spawn_blocking(move || store.save(&asset))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))??;
    Ok(saved)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Unprocessable(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidName(_) => AppError::BadRequest(err.to_string()),
            StoreError::Read { ref source, .. } if source.kind() == io::ErrorKind::NotFound => {
                AppError::NotFound(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
