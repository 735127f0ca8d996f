//! Pipeline stages for Markdown-to-WordPress publishing.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different image codec) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! convert ──▶ upload ──▶ rewrite ──▶ render ──▶ publish
//! (PNG→WebP)  (Drive)    (URLs)      (HTML)     (WordPress)
//! ```
//!
//! 1. [`convert`] — decode each PNG and write a WebP derivative; runs in
//!    `spawn_blocking` because codec work is CPU-bound
//! 2. upload — lives in [`crate::drive`]; the only stage with storage I/O
//! 3. [`rewrite`] — replace local image references with uploaded URLs,
//!    longest stem first
//! 4. [`render`] — Markdown → WordPress-ready HTML
//! 5. publish — lives in [`crate::wordpress`]; the only stage with CMS I/O

pub mod convert;
pub mod render;
pub mod rewrite;
