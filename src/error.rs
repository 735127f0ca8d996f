//! Error types for the md2press library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PressError`] — **Fatal**: the operation that returned it cannot
//!   proceed at all (unreadable document, missing credential, collaborator
//!   API rejection). Returned as `Err(Md2PressError)` from collaborator
//!   methods and from the top-level pipeline entry point.
//!
//! * [`StageError`] — **Non-fatal**: a single pipeline stage failed
//!   (conversion glitch, upload rejected, publish refused) but the run
//!   continues. Rendered into the [`crate::report::RunReport`] error list
//!   so callers can inspect partial success rather than losing the whole
//!   run to one bad stage.
//!
//! The separation is what makes the pipeline's "record and continue"
//! policy possible: stage code returns plain `Result<_, Md2PressError>`,
//! and only the orchestrator decides which tier a failure lands in.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2press library.
///
/// Stage-level failures are wrapped in [`StageError`] by the orchestrator
/// and recorded in the run report rather than propagated here.
#[derive(Debug, Error)]
pub enum Md2PressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Document file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    DocumentNotFound { path: PathBuf },

    /// Document file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Asset directory does not exist or is not a directory.
    #[error("Image directory not found: '{path}'")]
    ImageDirNotFound { path: PathBuf },

    // ── Configuration errors ─────────────────────────────────────────────
    /// A required credential was absent from both the explicit config and
    /// the environment.
    #[error("Missing credential: {var} is not set.\n{hint}")]
    MissingCredential { var: &'static str, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Collaborator errors ──────────────────────────────────────────────
    /// OAuth token exchange with the storage provider failed.
    #[error("Drive token exchange failed: {reason}")]
    TokenExchange { reason: String },

    /// An HTTP request to a collaborator could not be sent or completed.
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// A collaborator answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The WordPress connection check failed — credentials or site URL are
    /// wrong, so the publish stage cannot proceed.
    #[error("WordPress connection failed: {detail}\nCheck WORDPRESS_URL / WORDPRESS_USERNAME / WORDPRESS_APP_PASSWORD.")]
    ConnectionFailed { detail: String },

    /// A single asset failed to convert.
    #[error("Failed to convert '{path}': {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    /// A single asset failed to upload.
    #[error("Failed to upload '{path}': {detail}")]
    UploadFailed { path: PathBuf, detail: String },

    // ── Artifact I/O errors ──────────────────────────────────────────────
    /// Could not create or write a run artifact (mapping, plan, report).
    #[error("Failed to write artifact '{path}': {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a persisted artifact back from disk.
    #[error("Failed to read artifact '{path}': {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted artifact exists but does not parse.
    #[error("Failed to parse artifact '{path}': {detail}")]
    ArtifactParse { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single pipeline stage.
///
/// The orchestrator converts a stage's `Err(Md2PressError)` into one of
/// these and appends its rendered message to the run report; the run then
/// continues with the next stage. The wording of each variant matches the
/// strings persisted in the report's `errors` array.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StageError {
    /// The convert stage failed; later stages see zero converted files.
    #[error("Image conversion failed: {0}")]
    Conversion(String),

    /// The upload stage failed; later stages see a partial or empty mapping.
    #[error("Drive upload failed: {0}")]
    Upload(String),

    /// The publish-config artifact could not be generated or written.
    #[error("Config generation failed: {0}")]
    Config(String),

    /// The publish stage failed; the run ends without a post id.
    #[error("WordPress publish failed: {0}")]
    Publish(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_variable() {
        let e = Md2PressError::MissingCredential {
            var: "WORDPRESS_URL",
            hint: "Set it to your site base URL.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("WORDPRESS_URL"), "got: {msg}");
    }

    #[test]
    fn api_error_display() {
        let e = Md2PressError::Api {
            endpoint: "/wp-json/wp/v2/posts".into(),
            status: 403,
            body: "rest_forbidden".into(),
        };
        assert!(e.to_string().contains("403"));
        assert!(e.to_string().contains("rest_forbidden"));
    }

    #[test]
    fn stage_error_messages_match_report_wording() {
        assert_eq!(
            StageError::Upload("no token".into()).to_string(),
            "Drive upload failed: no token"
        );
        assert_eq!(
            StageError::Publish("401".into()).to_string(),
            "WordPress publish failed: 401"
        );
    }
}
