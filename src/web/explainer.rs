//! Static page copy
//!
//! Kept as markdown next to the code and rendered to HTML at startup.

use pulldown_cmark::{html, Options, Parser};

pub const INTRO_MD: &str = include_str!("intro.md");
pub const OPCUA_EXPLAINER_MD: &str = include_str!("opcua_explainer.md");

pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
