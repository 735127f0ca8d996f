//! The publish pipeline: convert → upload → configure → publish.
//!
//! ## Error isolation
//!
//! Every stage runs regardless of what earlier stages did. A stage failure
//! becomes a [`StageError`] appended to the run report's error list; the
//! downstream stages see degraded inputs (zero converted files, an empty
//! URL mapping) instead of an aborted run. The only fatal error before the
//! stages is an unreadable source document — with no document there is
//! nothing to configure or publish, and no stage output exists yet to lose.
//!
//! ## Artifacts
//!
//! Three JSON artifacts are persisted per run, all beside their inputs:
//! the URL mapping (`webp/drive_urls.json`), the publish plan
//! (`<stem>_publish_config.json`) and the run report
//! (`<stem>_publish_result.json`). The mapping is what makes
//! `--skip-upload` re-runs cheap; the other two are the audit trail.

use crate::config::{DriveCredentials, PublishOptions, WordPressCredentials};
use crate::document::{self, Document};
use crate::drive::DriveUploader;
use crate::error::{Md2PressError, StageError};
use crate::keywords::{extract_focus_keyword, DEFAULT_CATEGORY};
use crate::mapping::{UrlMapping, MAPPING_FILE};
use crate::pipeline::convert;
use crate::pipeline::render::markdown_to_html;
use crate::pipeline::rewrite::rewrite_references;
use crate::progress::PublishProgressCallback;
use crate::report::{RunReport, StepName, StepRecord};
use crate::wordpress::{NewPost, PostStatus, WordPressClient};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The derived publish configuration, persisted before the publish call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PublishPlan {
    pub source_file: PathBuf,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub focus_keyword: String,
    pub featured_image: String,
    pub author: String,
    pub date: String,
}

impl PublishPlan {
    /// Assemble the plan from the document's metadata.
    ///
    /// Focus keyword priority: first tag → first known clinical term in
    /// the title → the fixed default. Category: header value or the fixed
    /// default. Title: header value or the file stem.
    pub fn from_document(doc: &Document, md_path: &Path) -> Self {
        let meta = &doc.metadata;
        let title = meta.title.clone().unwrap_or_else(|| {
            md_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string()
        });
        let focus_keyword = extract_focus_keyword(&meta.tags, &title);

        Self {
            source_file: md_path.to_path_buf(),
            title,
            excerpt: meta.excerpt.clone().unwrap_or_default(),
            category: meta
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: meta.tags.clone(),
            focus_keyword,
            featured_image: meta.featured_image.clone().unwrap_or_default(),
            author: meta.author.clone().unwrap_or_default(),
            date: meta.date.clone().unwrap_or_default(),
        }
    }

    /// Persist the plan as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), Md2PressError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Md2PressError::Internal(format!("Plan serialisation failed: {e}")))?;
        std::fs::write(path, json).map_err(|source| Md2PressError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Identity of a successfully published post.
#[derive(Debug, Clone)]
pub struct PublishedPost {
    pub post_id: u64,
    pub post_url: String,
    pub status: PostStatus,
    pub title: String,
}

/// Run the four-stage publish pipeline for one document.
///
/// # Returns
/// `Ok(RunReport)` whenever the document could be read — inspect
/// [`RunReport::is_success`] for the actual outcome; a report with errors
/// is still `Ok`.
///
/// # Errors
/// Only for an unreadable document file or an invalid path.
pub async fn run_publish_pipeline(
    md_file: impl AsRef<Path>,
    options: &PublishOptions,
) -> Result<RunReport, Md2PressError> {
    let md_path = md_file.as_ref();
    info!("Starting publish pipeline: {}", md_path.display());

    let doc = document::load_document(md_path)?;
    let parent = non_empty_parent(md_path);
    let doc_stem = md_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    let image_dir = options
        .image_dir
        .clone()
        .unwrap_or_else(|| default_image_dir(md_path));
    let webp_dir = image_dir.join("webp");
    let progress = options.progress_callback.as_deref();

    let mut report = RunReport::new();

    // ── Stage 1: PNG → WebP conversion ───────────────────────────────────
    stage_start(progress, StepName::ImageConversion);
    match convert::convert_directory(&image_dir, &webp_dir).await {
        Ok(outcomes) => {
            info!("Converted {} files to WebP", outcomes.len());
            report.record_step(StepRecord::conversion(outcomes.len()));
        }
        Err(e) => stage_fail(
            &mut report,
            progress,
            StepName::ImageConversion,
            StageError::Conversion(e.to_string()),
        ),
    }

    // ── Stage 2: Drive upload ────────────────────────────────────────────
    stage_start(progress, StepName::GdriveUpload);
    let mapping_path = webp_dir.join(MAPPING_FILE);
    let url_mapping = if options.skip_upload && mapping_path.exists() {
        match UrlMapping::load(&mapping_path) {
            Ok(mapping) => {
                info!(
                    "Skipping upload — reusing {} mapped URLs from {}",
                    mapping.len(),
                    mapping_path.display()
                );
                mapping
            }
            Err(e) => {
                stage_fail(
                    &mut report,
                    progress,
                    StepName::GdriveUpload,
                    StageError::Upload(e.to_string()),
                );
                UrlMapping::new()
            }
        }
    } else {
        match upload_assets(&webp_dir, options, progress).await {
            Ok(mapping) => {
                let files = mapping.stems_longest_first().len();
                info!("Uploaded {} files ({} mapping entries)", files, mapping.len());
                report.record_step(StepRecord::upload(files));
                mapping
            }
            Err(e) => {
                stage_fail(
                    &mut report,
                    progress,
                    StepName::GdriveUpload,
                    StageError::Upload(e.to_string()),
                );
                UrlMapping::new()
            }
        }
    };

    // ── Stage 3: publish configuration ───────────────────────────────────
    stage_start(progress, StepName::ConfigGeneration);
    let plan = PublishPlan::from_document(&doc, md_path);
    let config_path = parent.join(format!("{doc_stem}_publish_config.json"));
    match plan.save(&config_path) {
        Ok(()) => {
            info!(
                "Config saved: {} (title: {:?}, category: {}, focus keyword: {})",
                config_path.display(),
                plan.title,
                plan.category,
                plan.focus_keyword
            );
            report.record_step(StepRecord::config(config_path.clone()));
        }
        Err(e) => stage_fail(
            &mut report,
            progress,
            StepName::ConfigGeneration,
            StageError::Config(e.to_string()),
        ),
    }

    // ── Stage 4: WordPress publish ───────────────────────────────────────
    stage_start(progress, StepName::WordpressPublish);
    let status = if options.publish_immediately {
        PostStatus::Publish
    } else {
        PostStatus::Draft
    };
    match publish_post(&doc, &url_mapping, &plan, status, options).await {
        Ok(published) => {
            info!("Post {}: {}", published.status, published.post_url);
            report.record_step(StepRecord::publish(
                published.post_id,
                published.post_url.clone(),
            ));
            report.post_id = Some(published.post_id);
            report.post_url = Some(published.post_url);
        }
        Err(e) => stage_fail(
            &mut report,
            progress,
            StepName::WordpressPublish,
            StageError::Publish(e.to_string()),
        ),
    }

    if let Some(cb) = progress {
        cb.on_pipeline_complete(report.errors.len());
    }

    // ── Persist the report ───────────────────────────────────────────────
    let result_path = parent.join(format!("{doc_stem}_publish_result.json"));
    if let Err(e) = report.save(&result_path) {
        warn!("Could not persist run report: {e}");
        report.errors.push(format!("Report write failed: {e}"));
    } else {
        info!("Run report saved to {}", result_path.display());
    }

    Ok(report)
}

/// Publish one document: rewrite references, render HTML, drive the client.
///
/// Featured-image and SEO meta writes are best-effort — the post already
/// exists by then, so their failure is logged but does not undo a
/// successful publish.
async fn publish_post(
    doc: &Document,
    mapping: &UrlMapping,
    plan: &PublishPlan,
    status: PostStatus,
    options: &PublishOptions,
) -> Result<PublishedPost, Md2PressError> {
    let credentials = match options.wordpress_credentials.clone() {
        Some(creds) => creds,
        None => WordPressCredentials::from_env()?,
    };
    let client = WordPressClient::new(&credentials, options.api_timeout_secs)?;
    client.check_connection().await?;

    let body = rewrite_references(&doc.body, mapping);
    let html = markdown_to_html(&body);

    let category_id = client.get_or_create_category(&plan.category).await?;
    let tag_ids = client.get_or_create_tags(&plan.tags).await?;

    let excerpt = (!plan.excerpt.is_empty()).then_some(plan.excerpt.as_str());
    let created = client
        .create_post(&NewPost {
            title: &plan.title,
            content: &html,
            status,
            categories: vec![category_id],
            tags: tag_ids,
            excerpt,
        })
        .await?;

    if let Some(url) = select_featured_url(mapping, doc.metadata.featured_image.as_deref()) {
        if let Err(e) = client.set_featured_image(created.id, &url).await {
            warn!("Failed to set featured image: {e}");
        }
    }

    let description = (!plan.excerpt.is_empty()).then(|| truncate_chars(&plan.excerpt, 160));
    if let Err(e) = client
        .set_seo_meta(created.id, &plan.focus_keyword, description.as_deref())
        .await
    {
        warn!("Failed to set SEO meta: {e}");
    }

    Ok(PublishedPost {
        post_id: created.id,
        post_url: created.link,
        status,
        title: plan.title.clone(),
    })
}

/// Construct the uploader and push every converted asset.
async fn upload_assets(
    webp_dir: &Path,
    options: &PublishOptions,
    progress: Option<&dyn PublishProgressCallback>,
) -> Result<UrlMapping, Md2PressError> {
    let credentials = match options.drive_credentials.clone() {
        Some(creds) => creds,
        None => DriveCredentials::from_env()?,
    };
    let uploader = DriveUploader::connect(
        credentials,
        options.drive_endpoints.clone(),
        options.api_timeout_secs,
    )
    .await?;
    uploader.upload_directory(webp_dir, progress).await
}

/// Choose the post's featured image URL.
///
/// The document's rendered first page is the strongest thumbnail, so any
/// mapping key marking it wins outright; only then is the header-declared
/// `featured_image` resolved through the mapping by stem.
pub fn select_featured_url(mapping: &UrlMapping, declared: Option<&str>) -> Option<String> {
    for (name, url) in mapping.iter() {
        if name.contains("paper_first_page") || name.contains("first_page") {
            return Some(url.to_string());
        }
    }
    declared
        .and_then(|reference| mapping.resolve_reference(reference))
        .map(String::from)
}

/// Default asset directory: `<md_file>/../../output/images/selected`,
/// the layout the upstream page-render tooling produces.
fn default_image_dir(md_path: &Path) -> PathBuf {
    let parent = non_empty_parent(md_path);
    let base = parent.parent().unwrap_or(parent);
    base.join("output").join("images").join("selected")
}

fn non_empty_parent(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn stage_start(progress: Option<&dyn PublishProgressCallback>, stage: StepName) {
    if let Some(cb) = progress {
        cb.on_stage_start(stage.as_str());
    }
}

fn stage_fail(
    report: &mut RunReport,
    progress: Option<&dyn PublishProgressCallback>,
    stage: StepName,
    err: StageError,
) {
    if let Some(cb) = progress {
        cb.on_stage_error(stage.as_str(), &err.to_string());
    }
    report.record_error(err);
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    #[test]
    fn plan_uses_first_tag_as_focus_keyword() {
        let doc = parse_document("---\ntitle: 제목\ntags: [투명교정, 교정]\n---\nbody\n");
        let plan = PublishPlan::from_document(&doc, Path::new("out/post.md"));
        assert_eq!(plan.focus_keyword, "투명교정");
        assert_eq!(plan.tags, vec!["투명교정", "교정"]);
    }

    #[test]
    fn plan_falls_back_to_title_keyword_then_default() {
        let doc = parse_document("---\ntitle: 인비절라인 사례 보고\n---\nbody\n");
        let plan = PublishPlan::from_document(&doc, Path::new("post.md"));
        assert_eq!(plan.focus_keyword, "인비절라인");

        let doc = parse_document("---\ntitle: Unrelated title\n---\nbody\n");
        let plan = PublishPlan::from_document(&doc, Path::new("post.md"));
        assert_eq!(plan.focus_keyword, crate::keywords::DEFAULT_FOCUS_KEYWORD);
    }

    #[test]
    fn plan_defaults_category_and_title() {
        let doc = parse_document("no header at all\n");
        let plan = PublishPlan::from_document(&doc, Path::new("dir/my_article.md"));
        assert_eq!(plan.category, DEFAULT_CATEGORY);
        assert_eq!(plan.title, "my_article");
    }

    #[test]
    fn plan_honours_declared_category() {
        let doc = parse_document("---\ntitle: t\ncategory: Custom\n---\nbody\n");
        let plan = PublishPlan::from_document(&doc, Path::new("post.md"));
        assert_eq!(plan.category, "Custom");
    }

    #[test]
    fn featured_prefers_first_page_over_declared() {
        let mut mapping = UrlMapping::new();
        mapping.insert("fig3.webp", "https://cdn.example/fig3");
        mapping.insert("paper_first_page.png", "https://cdn.example/cover");
        let url = select_featured_url(&mapping, Some("images/fig3.png"));
        assert_eq!(url.as_deref(), Some("https://cdn.example/cover"));
    }

    #[test]
    fn featured_resolves_declared_by_stem() {
        let mut mapping = UrlMapping::new();
        mapping.insert("fig3.webp", "https://cdn.example/fig3");
        let url = select_featured_url(&mapping, Some("images/fig3.png"));
        assert_eq!(url.as_deref(), Some("https://cdn.example/fig3"));
    }

    #[test]
    fn featured_none_when_nothing_matches() {
        assert_eq!(select_featured_url(&UrlMapping::new(), Some("x.png")), None);
        assert_eq!(select_featured_url(&UrlMapping::new(), None), None);
    }

    #[test]
    fn default_image_dir_two_levels_up() {
        let dir = default_image_dir(Path::new("project/output/post.md"));
        assert_eq!(dir, Path::new("project/output/images/selected"));
    }

    #[test]
    fn truncate_chars_counts_chars_not_bytes() {
        let korean = "교".repeat(200);
        let truncated = truncate_chars(&korean, 160);
        assert_eq!(truncated.chars().count(), 160);
    }
}
