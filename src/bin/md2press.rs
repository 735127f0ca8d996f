//! CLI binary for md2press.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PublishOptions` and prints the run summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2press::{
    run_publish_pipeline, PublishOptions, PublishProgressCallback, WordPressClient,
    WordPressCredentials,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a banner per stage and a live bar for the upload
/// batch. The bar is created lazily in `on_upload_start` because the file
/// count is unknown until the uploader has scanned the directory.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn finish_bar(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl PublishProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: &str) {
        self.finish_bar();
        let label = match stage {
            "image_conversion" => "Converting PNG to WebP",
            "gdrive_upload" => "Uploading to Google Drive",
            "config_generation" => "Preparing publish configuration",
            "wordpress_publish" => "Publishing to WordPress",
            other => other,
        };
        eprintln!("{} {}", cyan("◆"), bold(label));
    }

    fn on_upload_start(&self, total_files: usize) {
        let bar = ProgressBar::new(total_files as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Uploading");
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn on_file_uploaded(&self, _index: usize, _total: usize, file_name: &str, url: &str) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.println(format!("  {} {}  {}", green("✓"), file_name, dim(url)));
            bar.inc(1);
        }
    }

    fn on_stage_error(&self, _stage: &str, error: &str) {
        self.finish_bar();
        eprintln!("  {} {}", red("✗"), red(error));
    }

    fn on_pipeline_complete(&self, error_count: usize) {
        self.finish_bar();
        if error_count == 0 {
            eprintln!("{} {}", green("✔"), bold("Pipeline complete"));
        } else {
            eprintln!(
                "{} Pipeline finished with {} error(s)",
                red("✘"),
                bold(&error_count.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Create a draft from an article (images uploaded, references rewritten)
  md2press output/article.md

  # Publish immediately instead of leaving a draft
  md2press output/article.md --publish

  # Re-run without re-uploading (reuses webp/drive_urls.json)
  md2press output/article.md --skip-upload

  # Use a non-default image directory
  md2press output/article.md --image-dir assets/figures

  # Verify WordPress credentials only
  md2press output/article.md --test-connection

PIPELINE:
  1. Convert   <image-dir>/*.png            → <image-dir>/webp/*.webp
  2. Upload    webp files → Google Drive    → webp/drive_urls.json
  3. Plan      header metadata + keywords   → <stem>_publish_config.json
  4. Publish   rewritten HTML → WordPress   → <stem>_publish_result.json

  A stage failure is recorded and the run continues; the exit code is
  non-zero whenever the run report contains one or more errors.

DOCUMENT HEADER:
  ---
  title: Post title
  excerpt: One-paragraph summary
  tags: [keyword-one, keyword-two]
  category: Category name
  featured_image: images/cover.png
  author: Name
  date: 2025-11-02
  ---

ENVIRONMENT VARIABLES:
  GOOGLE_CLIENT_ID          Drive OAuth client id
  GOOGLE_CLIENT_SECRET      Drive OAuth client secret
  GOOGLE_REFRESH_TOKEN      Drive OAuth refresh token
  GOOGLE_DRIVE_FOLDER_ID    Destination folder (optional; Drive root if unset)
  WORDPRESS_URL             Site base URL, e.g. https://blog.example.com
  WORDPRESS_USERNAME        WordPress account user name
  WORDPRESS_APP_PASSWORD    Application password (user profile page)

SETUP:
  1. Export the credentials above.
  2. Draft:    md2press output/article.md
  3. Review the draft in wp-admin, then re-run with --publish
     (add --skip-upload to reuse the already-uploaded images).
"#;

/// Publish Markdown documents with local figure images to WordPress.
#[derive(Parser, Debug)]
#[command(
    name = "md2press",
    version,
    about = "Publish Markdown documents with local figure images to WordPress",
    long_about = "Convert a document's PNG figures to WebP, upload them to Google Drive, \
rewrite the document's image references to the uploaded URLs, render the Markdown to HTML, \
and create the WordPress post (draft by default) via the REST API.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to publish.
    md_file: PathBuf,

    /// Image directory (default: <md_file>/../../output/images/selected).
    #[arg(long, env = "MD2PRESS_IMAGE_DIR")]
    image_dir: Option<PathBuf>,

    /// Publish immediately instead of creating a draft.
    #[arg(long)]
    publish: bool,

    /// Skip the Drive upload and reuse the persisted URL mapping.
    #[arg(long)]
    skip_upload: bool,

    /// Test the WordPress connection and exit.
    #[arg(long)]
    test_connection: bool,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "MD2PRESS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PRESS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress callback provides the user-facing feedback; library
    // logs stay at error level unless explicitly requested.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Connection-test mode ─────────────────────────────────────────────
    if cli.test_connection {
        let credentials =
            WordPressCredentials::from_env().context("WordPress credentials required")?;
        let client = WordPressClient::new(&credentials, cli.api_timeout)
            .context("Failed to build WordPress client")?;
        let account = client
            .check_connection()
            .await
            .context("Connection test failed")?;
        println!(
            "{} Connected as: {} ({})",
            green("✔"),
            bold(&account.name),
            account.slug
        );
        return Ok(());
    }

    // ── Build options ────────────────────────────────────────────────────
    let mut builder = PublishOptions::builder()
        .publish_immediately(cli.publish)
        .skip_upload(cli.skip_upload)
        .api_timeout_secs(cli.api_timeout);
    if let Some(ref dir) = cli.image_dir {
        builder = builder.image_dir(dir);
    }
    if !cli.quiet {
        builder = builder.progress_callback(CliProgressCallback::new());
    }
    let options = builder.build().context("Invalid options")?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let report = run_publish_pipeline(&cli.md_file, &options)
        .await
        .context("Publish pipeline failed to start")?;

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        if let Some(ref url) = report.post_url {
            let status = if cli.publish { "publish" } else { "draft" };
            eprintln!("\nPost URL: {}", bold(url));
            eprintln!("Status:   {}", status);
        }
        if !report.errors.is_empty() {
            eprintln!("\n{} ({}):", red("Errors"), report.errors.len());
            for err in &report.errors {
                eprintln!("  - {err}");
            }
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
