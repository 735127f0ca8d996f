//! # md2press
//!
//! Publish Markdown documents with local figure images to WordPress.
//!
//! ## Why this crate?
//!
//! Turning a drafted article into a live post is four errands in a trench
//! coat: compress the figures, host them somewhere an `<img>` tag can
//! reach, point the document at the hosted copies, and drive the WordPress
//! REST API (category, tags, featured image, SEO meta) without fat-fingering
//! a step. This crate runs all four as one pipeline with per-stage error
//! isolation — a failed upload still produces a draft you can fix by hand,
//! and a persisted run report says exactly what happened.
//!
//! ## Pipeline Overview
//!
//! ```text
//! article.md + images/
//!  │
//!  ├─ 1. Convert  PNG page renders and figure crops → WebP
//!  ├─ 2. Upload   WebP files → Google Drive, public direct links
//!  ├─ 3. Plan     derive title/category/tags/focus keyword, persist config
//!  └─ 4. Publish  rewrite image references, render HTML, create the post
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2press::{run_publish_pipeline, PublishOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials auto-detected from GOOGLE_* / WORDPRESS_* env vars
//!     let options = PublishOptions::default();
//!     let report = run_publish_pipeline("output/article.md", &options).await?;
//!     if let Some(url) = &report.post_url {
//!         println!("Draft created: {url}");
//!     }
//!     for err in &report.errors {
//!         eprintln!("error: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2press` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! md2press = { version = "0.3", default-features = false }
//! ```
//!
//! ## Partial failure
//!
//! The pipeline never aborts on a stage failure. Each stage's outcome is
//! recorded in a [`report::RunReport`]; the run is considered failed iff
//! the report's error list is non-empty. See [`publish::run_publish_pipeline`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod drive;
pub mod error;
pub mod keywords;
pub mod mapping;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod report;
pub mod wordpress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DriveCredentials, PublishOptions, PublishOptionsBuilder, WordPressCredentials};
pub use document::{load_document, parse_document, Document, Metadata};
pub use drive::{DriveEndpoints, DriveUploader, UploadedAsset};
pub use error::{Md2PressError, StageError};
pub use mapping::{UrlMapping, MAPPING_FILE};
pub use pipeline::render::markdown_to_html;
pub use pipeline::rewrite::rewrite_references;
pub use progress::{NoopProgressCallback, ProgressCallback, PublishProgressCallback};
pub use publish::{run_publish_pipeline, select_featured_url, PublishPlan, PublishedPost};
pub use report::{RunReport, StepName, StepRecord, StepStatus};
pub use wordpress::{CreatedPost, NewPost, PostStatus, WordPressClient};
