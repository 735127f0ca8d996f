//! Reference rewriting: local image references → uploaded remote URLs.
//!
//! ## Why stem matching?
//!
//! The document references assets as its author saw them on disk —
//! `images/fig3.png`, `./fig3.png`, or just `fig3.webp` — while the
//! uploaded copy is the WebP derivative. The filename stem (`fig3`) is the
//! only stable identity across directory prefixes and extension changes,
//! so a reference matches when its path *contains* a mapped stem.
//!
//! ## Matching order
//!
//! Substring matching makes `fig1` a prefix-trap for `fig10`. The stems
//! are therefore consulted longest-first (see
//! [`crate::mapping::UrlMapping::stems_longest_first`]) and each reference
//! takes the first — i.e. longest — stem it contains. One pass over the
//! body per syntax form; the outcome is independent of mapping insertion
//! order.
//!
//! ## Idempotence
//!
//! A reference whose path is already one of the mapping's remote URLs is
//! left untouched, so rewriting an already-rewritten body changes nothing
//! even if an uploaded URL happens to contain another asset's stem.

use crate::mapping::UrlMapping;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Markdown image syntax: `![alt](path)`.
static RE_MD_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

/// Embedded HTML image source: `src="path"`.
static RE_HTML_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src="([^"]*)""#).unwrap());

/// Replace every local asset reference in `body` with its remote URL.
///
/// Covers both Markdown image syntax (alt text preserved verbatim) and raw
/// HTML `src="…"` attributes. References that match no stem — and bodies
/// rewritten with an empty mapping — come back unchanged; this function
/// never fails.
pub fn rewrite_references(body: &str, mapping: &UrlMapping) -> String {
    if mapping.is_empty() {
        return body.to_string();
    }

    let stems = mapping.stems_longest_first();

    let rewritten = RE_MD_IMAGE.replace_all(body, |caps: &Captures| {
        match resolve_path(&caps[2], &stems, mapping) {
            Some(url) => format!("![{}]({})", &caps[1], url),
            None => caps[0].to_string(),
        }
    });

    let rewritten = RE_HTML_SRC.replace_all(&rewritten, |caps: &Captures| {
        match resolve_path(&caps[1], &stems, mapping) {
            Some(url) => format!(r#"src="{url}""#),
            None => caps[0].to_string(),
        }
    });

    rewritten.into_owned()
}

/// The remote URL for a reference path, or `None` to leave it alone.
fn resolve_path<'a>(
    path: &str,
    stems: &'a [(String, String)],
    mapping: &UrlMapping,
) -> Option<&'a str> {
    // Already rewritten in a previous pass.
    if mapping.contains_url(path) {
        return None;
    }
    stems
        .iter()
        .find(|(stem, _)| path.contains(stem.as_str()))
        .map(|(_, url)| url.as_str())
}
