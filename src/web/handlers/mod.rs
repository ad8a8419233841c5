pub mod forms;
pub mod pages;

use axum::response::{IntoResponse, Response};

use crate::session::Session;

/// Attach the session cookie when the session was just issued
pub(crate) fn with_session_cookie(session: &Session, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some((name, value)) = session.cookie_header() {
        response.headers_mut().insert(name, value);
    }
    response
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
