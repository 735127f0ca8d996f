//! Asset conversion: PNG page renders and figure crops → WebP.
//!
//! ## Why spawn_blocking?
//!
//! Decoding a 150-DPI page render and re-encoding it as WebP is pure CPU
//! work that can take hundreds of milliseconds per file.
//! `tokio::task::spawn_blocking` moves the batch onto the blocking thread
//! pool so the async runtime's worker threads stay responsive, even though
//! files are still converted strictly one at a time.
//!
//! ## Why WebP?
//!
//! The target site serves the images straight from Drive to readers; WebP
//! cuts page-render sizes to a fraction of the PNG while WordPress and
//! every modern browser render it natively. The encoder is the `image`
//! crate's lossless WebP — there is no quality knob to mis-set.

use crate::error::Md2PressError;
use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of converting a single asset.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub original_bytes: u64,
    pub converted_bytes: u64,
}

impl ConversionOutcome {
    /// Size reduction as a percentage of the original (negative when the
    /// lossless encoding came out larger).
    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.converted_bytes as f64 / self.original_bytes as f64) * 100.0
    }
}

/// Convert every `*.png` in `input_dir` to `<stem>.webp` in `output_dir`.
///
/// Creates `output_dir` if needed. Files are processed in name order so
/// logs and outcomes are deterministic. The whole batch runs inside
/// `spawn_blocking`.
///
/// # Errors
/// Fails on a missing input directory, an undecodable file, or an
/// unwritable output — the orchestrator records the failure and continues
/// with zero converted files.
pub async fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<ConversionOutcome>, Md2PressError> {
    let input_dir = input_dir.to_path_buf();
    let output_dir = output_dir.to_path_buf();

    tokio::task::spawn_blocking(move || convert_directory_blocking(&input_dir, &output_dir))
        .await
        .map_err(|e| Md2PressError::Internal(format!("Conversion task panicked: {e}")))?
}

fn convert_directory_blocking(
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<ConversionOutcome>, Md2PressError> {
    if !input_dir.is_dir() {
        return Err(Md2PressError::ImageDirNotFound {
            path: input_dir.to_path_buf(),
        });
    }

    let mut png_files: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .map_err(|source| Md2PressError::ArtifactRead {
            path: input_dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"))
        })
        .collect();
    png_files.sort();

    std::fs::create_dir_all(output_dir).map_err(|source| Md2PressError::ArtifactWrite {
        path: output_dir.to_path_buf(),
        source,
    })?;

    info!(
        "Converting {} PNG files from {} to WebP",
        png_files.len(),
        input_dir.display()
    );

    let mut outcomes = Vec::with_capacity(png_files.len());
    for png in &png_files {
        let file_stem = png
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Md2PressError::ConversionFailed {
                path: png.clone(),
                detail: "file name is not valid UTF-8".into(),
            })?;
        let webp = output_dir.join(format!("{file_stem}.webp"));
        let outcome = convert_file(png, &webp)?;
        debug!(
            "{} -> {} ({:.1}% smaller)",
            png.display(),
            webp.display(),
            outcome.reduction_percent()
        );
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Convert one PNG to WebP.
fn convert_file(input: &Path, output: &Path) -> Result<ConversionOutcome, Md2PressError> {
    let img = image::open(input).map_err(|e| Md2PressError::ConversionFailed {
        path: input.to_path_buf(),
        detail: e.to_string(),
    })?;
    let original_bytes = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);

    // The lossless WebP encoder accepts RGB8/RGBA8 buffers only.
    let rgba = img.to_rgba8();
    let file = File::create(output).map_err(|source| Md2PressError::ArtifactWrite {
        path: output.to_path_buf(),
        source,
    })?;
    let encoder = WebPEncoder::new_lossless(BufWriter::new(file));
    encoder
        .encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| Md2PressError::ConversionFailed {
            path: input.to_path_buf(),
            detail: e.to_string(),
        })?;

    let converted_bytes = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);

    Ok(ConversionOutcome {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        original_bytes,
        converted_bytes,
    })
}
