//! Per-visitor form state
//!
//! Holds what a visitor has entered between requests: the DCAT draft, the
//! current drill-down selection, the OPC UA values added so far, the last
//! search and pending flash messages. Sessions live in a Moka cache keyed by
//! a random cookie value and expire after an idle TTL.

use axum::http::{header, HeaderMap, HeaderValue};
use moka::future::Cache;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::asset::{DcatForm, OpcuaValues};
use crate::hierarchy::Selection;
use crate::store::SavedAsset;

pub const SESSION_COOKIE: &str = "rox_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashKind::Success => "flash flash-success",
            FlashKind::Info => "flash flash-info",
            FlashKind::Warning => "flash flash-warning",
            FlashKind::Error => "flash flash-error",
        }
    }
}

/// One-shot message shown on the next page render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub draft: DcatForm,
    /// `None` until the visitor picks an object type
    pub selection: Option<Selection>,
    pub opcua_values: OpcuaValues,
    pub search_term: String,
    pub last_saved: Option<SavedAsset>,
    flashes: Vec<Flash>,
}

impl SessionState {
    pub fn flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.flashes.push(Flash { kind, message: message.into() });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

pub type SharedSession = Arc<Mutex<SessionState>>;

/// A session resolved for one request
pub struct Session {
    pub id: String,
    pub state: SharedSession,
    /// Set when the cookie has to be (re)issued
    pub is_new: bool,
}

impl Session {
    /// `Set-Cookie` header for a newly issued session
    pub fn cookie_header(&self) -> Option<(header::HeaderName, HeaderValue)> {
        if !self.is_new {
            return None;
        }
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
        HeaderValue::from_str(&cookie).ok().map(|v| (header::SET_COOKIE, v))
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, SharedSession>,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle_ttl)
            .build();
        Self { sessions }
    }

    /// Session named by the request cookie, or a fresh one
    pub async fn resolve(&self, headers: &HeaderMap) -> Session {
        if let Some(id) = session_id_from_headers(headers) {
            if let Some(state) = self.sessions.get(&id).await {
                return Session { id, state, is_new: false };
            }
            tracing::debug!("Session {} expired or unknown, issuing a new one", id);
        }

        let id = new_session_id();
        let state: SharedSession = Arc::new(Mutex::new(SessionState::default()));
        self.sessions.insert(id.clone(), state.clone()).await;
        Session { id, state, is_new: true }
    }
}

fn new_session_id() -> String {
    let value: u128 = rand::thread_rng().gen();
    format!("{:032x}", value)
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
