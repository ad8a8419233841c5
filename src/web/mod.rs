//! HTML form layer
//!
//! - `handlers/`: page and form-action handlers
//! - `view_models`: template-ready views built from session state
//! - `explainer`: static page copy rendered from markdown

pub mod explainer;
pub mod handlers;
pub mod view_models;
