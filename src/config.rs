//! Configuration types for the publish pipeline.
//!
//! Run behaviour is controlled through [`PublishOptions`], built via its
//! [`PublishOptionsBuilder`]. Collaborator credentials live in explicit
//! structs ([`DriveCredentials`], [`WordPressCredentials`]) that are passed
//! into each collaborator's constructor — a missing field surfaces as a
//! typed [`Md2PressError::MissingCredential`] when the owning stage starts,
//! never as a panic at first use.
//!
//! # Design choice: builder over constructor
//! The options struct keeps growing a field at a time (skip flags, endpoint
//! overrides, progress callback). The builder lets callers set only what
//! they care about and rely on documented defaults for the rest.

use crate::drive::DriveEndpoints;
use crate::error::Md2PressError;
use crate::progress::PublishProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one publish run.
///
/// Built via [`PublishOptions::builder()`] or [`PublishOptions::default()`].
///
/// # Example
/// ```rust
/// use md2press::PublishOptions;
///
/// let options = PublishOptions::builder()
///     .publish_immediately(false)
///     .skip_upload(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PublishOptions {
    /// Directory of source PNG assets. Default: `None`, which resolves to
    /// `<md_file>/../../output/images/selected` — the layout the upstream
    /// page-render tooling produces.
    pub image_dir: Option<PathBuf>,

    /// Create the post with status `publish` instead of `draft`. Default: false.
    ///
    /// Draft-by-default exists because a created post cannot be un-created
    /// by this tool; a draft lets a human review the rewritten images and
    /// rendered HTML before anything goes live.
    pub publish_immediately: bool,

    /// Reuse the persisted URL mapping instead of uploading. Default: false.
    ///
    /// Uploads are the only expensive non-idempotent stage — re-running a
    /// failed publish without this flag would push every image to Drive
    /// again and mint fresh URLs. With the flag set and `drive_urls.json`
    /// present, the uploader is never constructed at all.
    pub skip_upload: bool,

    /// Per-request HTTP timeout in seconds for both collaborators. Default: 60.
    pub api_timeout_secs: u64,

    /// Explicit Drive credentials. Default: `None` — the upload stage reads
    /// `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` / `GOOGLE_REFRESH_TOKEN`
    /// / `GOOGLE_DRIVE_FOLDER_ID` from the environment instead.
    pub drive_credentials: Option<DriveCredentials>,

    /// Explicit WordPress credentials. Default: `None` — the publish stage
    /// reads `WORDPRESS_URL` / `WORDPRESS_USERNAME` /
    /// `WORDPRESS_APP_PASSWORD` from the environment instead.
    pub wordpress_credentials: Option<WordPressCredentials>,

    /// Drive API endpoints. Defaults to the public Google hosts; tests
    /// point this at a local mock server.
    pub drive_endpoints: DriveEndpoints,

    /// Progress callback invoked as stages and uploads advance.
    pub progress_callback: Option<Arc<dyn PublishProgressCallback>>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            image_dir: None,
            publish_immediately: false,
            skip_upload: false,
            api_timeout_secs: 60,
            drive_credentials: None,
            wordpress_credentials: None,
            drive_endpoints: DriveEndpoints::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PublishOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishOptions")
            .field("image_dir", &self.image_dir)
            .field("publish_immediately", &self.publish_immediately)
            .field("skip_upload", &self.skip_upload)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "drive_credentials",
                &self.drive_credentials.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "wordpress_credentials",
                &self.wordpress_credentials.as_ref().map(|_| "<redacted>"),
            )
            .field("drive_endpoints", &self.drive_endpoints)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl PublishOptions {
    /// Create a new builder for `PublishOptions`.
    pub fn builder() -> PublishOptionsBuilder {
        PublishOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`PublishOptions`].
pub struct PublishOptionsBuilder {
    options: PublishOptions,
}

impl PublishOptionsBuilder {
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.image_dir = Some(dir.into());
        self
    }

    pub fn publish_immediately(mut self, v: bool) -> Self {
        self.options.publish_immediately = v;
        self
    }

    pub fn skip_upload(mut self, v: bool) -> Self {
        self.options.skip_upload = v;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.options.api_timeout_secs = secs.max(1);
        self
    }

    pub fn drive_credentials(mut self, creds: DriveCredentials) -> Self {
        self.options.drive_credentials = Some(creds);
        self
    }

    pub fn wordpress_credentials(mut self, creds: WordPressCredentials) -> Self {
        self.options.wordpress_credentials = Some(creds);
        self
    }

    pub fn drive_endpoints(mut self, endpoints: DriveEndpoints) -> Self {
        self.options.drive_endpoints = endpoints;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn PublishProgressCallback>) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<PublishOptions, Md2PressError> {
        let o = &self.options;
        if let Some(ref dir) = o.image_dir {
            if dir.as_os_str().is_empty() {
                return Err(Md2PressError::InvalidConfig(
                    "Image directory must not be empty".into(),
                ));
            }
        }
        Ok(self.options)
    }
}

// ── Collaborator credentials ─────────────────────────────────────────────

/// Google Drive OAuth credentials for the asset uploader.
///
/// Passed into [`crate::drive::DriveUploader::connect`]. The folder id is
/// optional — without it files land in the Drive root.
#[derive(Clone)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub folder_id: Option<String>,
}

impl DriveCredentials {
    /// Load credentials from the environment.
    ///
    /// # Errors
    /// [`Md2PressError::MissingCredential`] naming the first absent variable.
    pub fn from_env() -> Result<Self, Md2PressError> {
        Ok(Self {
            client_id: require_env("GOOGLE_CLIENT_ID", "OAuth client id of the Drive project")?,
            client_secret: require_env(
                "GOOGLE_CLIENT_SECRET",
                "OAuth client secret of the Drive project",
            )?,
            refresh_token: require_env(
                "GOOGLE_REFRESH_TOKEN",
                "long-lived refresh token authorised for the Drive scope",
            )?,
            folder_id: std::env::var("GOOGLE_DRIVE_FOLDER_ID")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }
}

impl fmt::Debug for DriveCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

/// WordPress REST credentials for the publishing client.
///
/// `site_url` is the site base (e.g. `https://blog.example.com`); the
/// client appends `/wp-json/wp/v2`. Application passwords come from the
/// WordPress user profile page, not the login password.
#[derive(Clone)]
pub struct WordPressCredentials {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

impl WordPressCredentials {
    /// Create credentials, normalising a trailing slash off the site URL.
    pub fn new(
        site_url: impl Into<String>,
        username: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            app_password: app_password.into(),
        }
    }

    /// Load credentials from the environment.
    ///
    /// # Errors
    /// [`Md2PressError::MissingCredential`] naming the first absent variable.
    pub fn from_env() -> Result<Self, Md2PressError> {
        let site_url = require_env("WORDPRESS_URL", "base URL of the WordPress site")?;
        let username = require_env("WORDPRESS_USERNAME", "WordPress account user name")?;
        let app_password = require_env(
            "WORDPRESS_APP_PASSWORD",
            "application password from the user profile page",
        )?;
        Ok(Self::new(site_url, username, app_password))
    }
}

impl fmt::Debug for WordPressCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordPressCredentials")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

fn require_env(var: &'static str, hint: &str) -> Result<String, Md2PressError> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(Md2PressError::MissingCredential {
            var,
            hint: format!("Expected: {hint}."),
        }),
    }
}
