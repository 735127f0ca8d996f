//! Progress-callback trait for pipeline and upload events.
//!
//! Inject an [`Arc<dyn PublishProgressCallback>`] via
//! [`crate::config::PublishOptionsBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages and the uploader pushes
//! files.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log file, or a job
//! queue — without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so the same
//! implementation also works from multi-threaded hosts, even though the
//! pipeline itself runs stages strictly in sequence.

use std::sync::Arc;

/// Called by the publish pipeline as it advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PublishProgressCallback: Send + Sync {
    /// Called as each pipeline stage begins.
    ///
    /// # Arguments
    /// * `stage` — the stage's report name, e.g. `"image_conversion"`
    fn on_stage_start(&self, stage: &str) {
        let _ = stage;
    }

    /// Called once before any file is uploaded.
    ///
    /// # Arguments
    /// * `total_files` — number of files the uploader will attempt
    fn on_upload_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called after each successful upload.
    ///
    /// # Arguments
    /// * `index`     — 1-indexed position within the batch
    /// * `total`     — total files in the batch
    /// * `file_name` — base name of the uploaded file
    /// * `url`       — the durable remote URL it resolved to
    fn on_file_uploaded(&self, index: usize, total: usize, file_name: &str, url: &str) {
        let _ = (index, total, file_name, url);
    }

    /// Called when a stage fails (the run continues).
    ///
    /// # Arguments
    /// * `stage` — the stage's report name
    /// * `error` — human-readable error description
    fn on_stage_error(&self, stage: &str, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the last stage, before the report is persisted.
    ///
    /// # Arguments
    /// * `error_count` — number of errors the run accumulated
    fn on_pipeline_complete(&self, error_count: usize) {
        let _ = error_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PublishProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PublishOptions`].
pub type ProgressCallback = Arc<dyn PublishProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingCallback {
        stages: Mutex<Vec<String>>,
        uploads: AtomicUsize,
        errors: AtomicUsize,
        final_errors: AtomicUsize,
    }

    impl PublishProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: &str) {
            self.stages.lock().unwrap().push(stage.to_string());
        }

        fn on_file_uploaded(&self, _index: usize, _total: usize, _file_name: &str, _url: &str) {
            self.uploads.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_error(&self, _stage: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pipeline_complete(&self, error_count: usize) {
            self.final_errors.store(error_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start("image_conversion");
        cb.on_upload_start(3);
        cb.on_file_uploaded(1, 3, "fig1.webp", "https://cdn.example/a");
        cb.on_stage_error("gdrive_upload", "token expired");
        cb.on_pipeline_complete(1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            stages: Mutex::new(Vec::new()),
            uploads: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            final_errors: AtomicUsize::new(0),
        };

        tracker.on_stage_start("image_conversion");
        tracker.on_stage_start("gdrive_upload");
        tracker.on_file_uploaded(1, 2, "a.webp", "https://cdn.example/a");
        tracker.on_file_uploaded(2, 2, "b.webp", "https://cdn.example/b");
        tracker.on_stage_error("wordpress_publish", "401");
        tracker.on_pipeline_complete(1);

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec!["image_conversion", "gdrive_upload"]
        );
        assert_eq!(tracker.uploads.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn PublishProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_upload_start(10);
        cb.on_file_uploaded(1, 10, "fig.webp", "https://cdn.example/x");
    }
}
