//! Markup rendering: Markdown body → WordPress-ready HTML.
//!
//! WordPress accepts raw HTML in the post `content` field, so the renderer
//! produces plain HTML with GFM tables and strikethrough enabled. Soft
//! line breaks become `<br>` because the drafting tooling writes Korean
//! prose with semantic single newlines — WordPress's own autop filter is
//! bypassed when posting through the REST API, and without the hard breaks
//! the paragraphs collapse into walls of text.
//!
//! Any metadata header has already been removed by the content loader;
//! this stage sees only the (reference-rewritten) body.

use pulldown_cmark::{html, Event, Options, Parser};

/// Render a Markdown body to HTML.
pub fn markdown_to_html(body: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;

    let parser = Parser::new_ext(body, options).map(|event| match event {
        // nl2br: single newlines inside a paragraph are intentional breaks.
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut html_out = String::with_capacity(body.len() * 2);
    html::push_html(&mut html_out, parser);
    html_out
}
