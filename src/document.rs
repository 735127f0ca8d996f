//! Content loading: a Markdown file with an optional metadata header.
//!
//! Documents produced by the upstream drafting tooling begin with a
//! `---`-delimited key-value block (title, excerpt, tags, …) followed by
//! the Markdown body. The parser here is deliberately lenient: a missing
//! or unterminated header, an unknown key, or a line without a colon all
//! degrade to "less metadata", never to an error — the pipeline publishes
//! with defaults rather than refusing the document (a garbled header is a
//! drafting mistake, not a reason to lose the converted/uploaded assets).

use crate::error::Md2PressError;
use std::path::Path;
use tracing::{debug, warn};

/// A loaded document: parsed metadata plus the Markdown body.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub metadata: Metadata,
    /// The Markdown body with any metadata header removed.
    pub body: String,
}

/// Metadata recognised from the document header.
///
/// Every field is optional; `tags` defaults to empty. Unrecognised keys
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// Read and parse a document from disk.
///
/// # Errors
/// [`Md2PressError::DocumentNotFound`] / [`Md2PressError::DocumentRead`] —
/// the only fatal errors the content loader produces. Header problems are
/// not errors (see [`parse_document`]).
pub fn load_document(path: &Path) -> Result<Document, Md2PressError> {
    if !path.exists() {
        return Err(Md2PressError::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| Md2PressError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_document(&content);
    debug!(
        "Loaded document '{}': title={:?}, {} tags, {} byte body",
        path.display(),
        doc.metadata.title,
        doc.metadata.tags.len(),
        doc.body.len()
    );
    Ok(doc)
}

/// Parse a document string into metadata and body.
///
/// A header exists only when the first line is exactly `---` and a later
/// line closes it. Anything else — including a malformed block — yields
/// empty metadata and the whole input as body.
pub fn parse_document(content: &str) -> Document {
    let Some((header, body)) = split_header(content) else {
        return Document {
            metadata: Metadata::default(),
            body: content.to_string(),
        };
    };

    Document {
        metadata: parse_header(header),
        body: body.to_string(),
    }
}

/// Split off a `---`-delimited header. Returns `(header, body)` or `None`
/// when no well-formed header is present.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    // The opening delimiter must be a line of its own.
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    // Find the closing delimiter line.
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body.trim_start_matches('\n')));
        }
        offset += line.len();
    }
    None
}

/// Parse the key-value lines of a header block.
///
/// Supports `key: value` lines, inline sequences (`tags: [a, b]`), and
/// indented `- item` continuation lines for `tags`.
fn parse_header(header: &str) -> Metadata {
    let mut meta = Metadata::default();
    let mut in_tags_list = false;

    for line in header.lines() {
        // Continuation items for a block-style tags list.
        let trimmed = line.trim_start();
        if in_tags_list && trimmed.starts_with("- ") {
            let item = unquote(trimmed[2..].trim());
            if !item.is_empty() {
                meta.tags.push(item);
            }
            continue;
        }
        in_tags_list = false;

        let Some((key, value)) = line.split_once(':') else {
            if !line.trim().is_empty() {
                warn!("Ignoring malformed header line: {line:?}");
            }
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "title" => meta.title = non_empty(value),
            "excerpt" => meta.excerpt = non_empty(value),
            "category" => meta.category = non_empty(value),
            "featured_image" => meta.featured_image = non_empty(value),
            "author" => meta.author = non_empty(value),
            "date" => meta.date = non_empty(value),
            "tags" => {
                if value.is_empty() {
                    in_tags_list = true;
                } else {
                    meta.tags = parse_inline_list(value);
                }
            }
            _ => {}
        }
    }

    meta
}

/// Parse `[a, b, c]` (brackets optional) into a list of strings.
fn parse_inline_list(value: &str) -> Vec<String> {
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let v = unquote(value);
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Strip one pair of matching single or double quotes.
fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
    {
        v[1..v.len() - 1].to_string()
    } else {
        v.to_string()
    }
}
