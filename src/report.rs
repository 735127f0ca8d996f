//! The run report: per-step records, accumulated errors, publish identity.
//!
//! The report is the pipeline's source of truth for "what happened" — the
//! process exit code, the CLI summary, and post-mortem debugging all read
//! it. Persisted as `<stem>_publish_result.json` beside the source
//! document so a failed run leaves its evidence next to the input that
//! produced it.
//!
//! The overall run is a failure if and only if `errors` is non-empty,
//! regardless of how many steps succeeded — callers who need attribution
//! inspect the step records.

use crate::error::{Md2PressError, StageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

/// Pipeline step names as they appear in the persisted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    ImageConversion,
    GdriveUpload,
    ConfigGeneration,
    WordpressPublish,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::ImageConversion => "image_conversion",
            StepName::GdriveUpload => "gdrive_upload",
            StepName::ConfigGeneration => "config_generation",
            StepName::WordpressPublish => "wordpress_publish",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failure,
}

/// One entry in the report's `steps` array. Only the fields relevant to
/// the step are serialised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepName,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_converted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_uploaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
}

impl StepRecord {
    fn bare(step: StepName) -> Self {
        Self {
            step,
            status: StepStatus::Success,
            files_converted: None,
            files_uploaded: None,
            config_file: None,
            post_id: None,
            post_url: None,
        }
    }

    pub fn conversion(files_converted: usize) -> Self {
        Self {
            files_converted: Some(files_converted),
            ..Self::bare(StepName::ImageConversion)
        }
    }

    pub fn upload(files_uploaded: usize) -> Self {
        Self {
            files_uploaded: Some(files_uploaded),
            ..Self::bare(StepName::GdriveUpload)
        }
    }

    pub fn config(config_file: PathBuf) -> Self {
        Self {
            config_file: Some(config_file),
            ..Self::bare(StepName::ConfigGeneration)
        }
    }

    pub fn publish(post_id: u64, post_url: String) -> Self {
        Self {
            post_id: Some(post_id),
            post_url: Some(post_url),
            ..Self::bare(StepName::WordpressPublish)
        }
    }
}

/// The accumulated outcome of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a successful step record.
    pub fn record_step(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    /// Append a stage failure: logged, listed in `errors`, and the run
    /// continues.
    pub fn record_error(&mut self, err: StageError) {
        error!("{err}");
        self.errors.push(err.to_string());
    }

    /// The run succeeded iff no stage recorded an error.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Persist the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), Md2PressError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Md2PressError::Internal(format!("Report serialisation failed: {e}")))?;
        std::fs::write(path, json).map_err(|source| Md2PressError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a persisted report (used by tests and tooling).
    pub fn load(path: &Path) -> Result<Self, Md2PressError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| Md2PressError::ArtifactRead {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|e| Md2PressError::ArtifactParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_serialise_snake_case() {
        let json = serde_json::to_value(StepName::GdriveUpload).unwrap();
        assert_eq!(json, "gdrive_upload");
        assert_eq!(StepName::WordpressPublish.as_str(), "wordpress_publish");
    }

    #[test]
    fn step_record_serialises_only_relevant_fields() {
        let json = serde_json::to_value(StepRecord::conversion(4)).unwrap();
        assert_eq!(json["step"], "image_conversion");
        assert_eq!(json["status"], "success");
        assert_eq!(json["files_converted"], 4);
        assert!(json.get("post_id").is_none());
    }

    #[test]
    fn report_success_tracks_errors() {
        let mut report = RunReport::new();
        assert!(report.is_success());
        report.record_step(StepRecord::upload(3));
        assert!(report.is_success());
        report.record_error(StageError::Publish("connection refused".into()));
        assert!(!report.is_success());
        assert_eq!(
            report.errors,
            vec!["WordPress publish failed: connection refused"]
        );
    }

    #[test]
    fn report_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");

        let mut report = RunReport::new();
        report.record_step(StepRecord::publish(42, "https://blog.example/p/42".into()));
        report.post_id = Some(42);
        report.post_url = Some("https://blog.example/p/42".into());
        report.save(&path).unwrap();

        let loaded = RunReport::load(&path).unwrap();
        assert_eq!(loaded.post_id, Some(42));
        assert_eq!(loaded.steps.len(), 1);
        assert_eq!(loaded.steps[0].step, StepName::WordpressPublish);
        assert!(loaded.is_success());
    }
}
