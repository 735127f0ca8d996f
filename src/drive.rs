//! Google Drive uploader: local assets → durable public URLs.
//!
//! ## Why Drive as an image CDN?
//!
//! The target WordPress install deliberately keeps its media library empty
//! (hosting quota) and hot-links post images from Drive instead. The
//! `lh3.googleusercontent.com/d/<id>` form serves the raw image bytes
//! without an interstitial, which is what an `<img src=…>` needs.
//!
//! ## Auth model
//!
//! [`DriveUploader::connect`] performs exactly one refresh-token exchange
//! and holds the resulting access token for the lifetime of the uploader —
//! a publish run finishes well inside a token's validity window. There is
//! no re-auth loop; an expired token simply fails the upload stage and is
//! recorded like any other upload error.

use crate::config::DriveCredentials;
use crate::error::Md2PressError;
use crate::mapping::{stem, UrlMapping, MAPPING_FILE};
use crate::progress::PublishProgressCallback;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Drive API endpoints, overridable for tests.
#[derive(Debug, Clone)]
pub struct DriveEndpoints {
    /// OAuth token endpoint.
    pub token_url: String,
    /// Multipart upload endpoint.
    pub upload_url: String,
    /// Files resource endpoint (permissions live under it).
    pub files_url: String,
    /// Base of the direct-view URL handed to the document.
    pub direct_link_base: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://oauth2.googleapis.com/token".into(),
            upload_url: "https://www.googleapis.com/upload/drive/v3/files".into(),
            files_url: "https://www.googleapis.com/drive/v3/files".into(),
            direct_link_base: "https://lh3.googleusercontent.com/d".into(),
        }
    }
}

impl DriveEndpoints {
    /// Point every endpoint at one base URL (a mock server in tests).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            token_url: format!("{base}/token"),
            upload_url: format!("{base}/upload/drive/v3/files"),
            files_url: format!("{base}/drive/v3/files"),
            direct_link_base: format!("{base}/d"),
        }
    }
}

/// Result of uploading a single file.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub file_id: String,
    pub file_name: String,
    pub web_view_link: Option<String>,
    /// Redirect-free URL suitable for `<img src=…>` embedding.
    pub direct_link: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    #[serde(rename = "webViewLink")]
    web_view_link: Option<String>,
}

/// Authenticated Drive client for uploading assets.
#[derive(Debug)]
pub struct DriveUploader {
    http: reqwest::Client,
    endpoints: DriveEndpoints,
    access_token: String,
    folder_id: Option<String>,
}

impl DriveUploader {
    /// Exchange the refresh token for an access token and return a ready
    /// uploader.
    ///
    /// # Errors
    /// [`Md2PressError::TokenExchange`] when the OAuth endpoint rejects the
    /// credentials; [`Md2PressError::Request`] when it is unreachable.
    pub async fn connect(
        credentials: DriveCredentials,
        endpoints: DriveEndpoints,
        timeout_secs: u64,
    ) -> Result<Self, Md2PressError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Md2PressError::Internal(format!("HTTP client build failed: {e}")))?;

        let response = http
            .post(&endpoints.token_url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|source| Md2PressError::Request {
                endpoint: endpoints.token_url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Md2PressError::TokenExchange {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| Md2PressError::TokenExchange {
                    reason: format!("malformed token response: {e}"),
                })?;

        debug!("Drive token exchange succeeded");
        Ok(Self {
            http,
            endpoints,
            access_token: token.access_token,
            folder_id: credentials.folder_id,
        })
    }

    /// Upload one file, make it world-readable, and return its URLs.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedAsset, Md2PressError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Md2PressError::UploadFailed {
                path: path.to_path_buf(),
                detail: "file name is not valid UTF-8".into(),
            })?
            .to_string();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Md2PressError::UploadFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let metadata = serde_json::json!({
            "name": file_name,
            "parents": self.folder_id.as_ref().map(|id| vec![id.clone()]).unwrap_or_default(),
        });

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(|e| Md2PressError::Internal(e.to_string()))?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name.clone())
                    .mime_str(mime_for_extension(path))
                    .map_err(|e| Md2PressError::Internal(e.to_string()))?,
            );

        let endpoint = format!(
            "{}?uploadType=multipart&fields=id,name,webViewLink",
            self.endpoints.upload_url
        );
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|source| Md2PressError::Request {
                endpoint: self.endpoints.upload_url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Md2PressError::Api {
                endpoint: self.endpoints.upload_url.clone(),
                status,
                body,
            });
        }

        let file: DriveFile = response.json().await.map_err(|e| Md2PressError::UploadFailed {
            path: path.to_path_buf(),
            detail: format!("malformed upload response: {e}"),
        })?;

        self.make_public(&file.id).await?;

        let direct_link = format!("{}/{}", self.endpoints.direct_link_base, file.id);
        debug!("Uploaded {} -> {}", file_name, direct_link);

        Ok(UploadedAsset {
            file_id: file.id,
            file_name,
            web_view_link: file.web_view_link,
            direct_link,
        })
    }

    /// Grant anyone-with-the-link read access.
    async fn make_public(&self, file_id: &str) -> Result<(), Md2PressError> {
        let endpoint = format!("{}/{}/permissions", self.endpoints.files_url, file_id);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|source| Md2PressError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Md2PressError::Api {
                endpoint,
                status,
                body,
            });
        }
        Ok(())
    }

    /// Upload every `*.webp` in `dir`, persist the URL mapping beside the
    /// assets, and return it.
    ///
    /// Each uploaded file is keyed twice in the mapping — as `<stem>.png`
    /// (the name the document references) and as its own WebP name — both
    /// pointing at the same direct link.
    pub async fn upload_directory(
        &self,
        dir: &Path,
        progress: Option<&dyn PublishProgressCallback>,
    ) -> Result<UrlMapping, Md2PressError> {
        let mut webp_files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|source| Md2PressError::ArtifactRead {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("webp"))
            })
            .collect();
        webp_files.sort();

        info!("Uploading {} files from {}", webp_files.len(), dir.display());
        if let Some(cb) = progress {
            cb.on_upload_start(webp_files.len());
        }

        let total = webp_files.len();
        let mut mapping = UrlMapping::new();
        for (i, file) in webp_files.iter().enumerate() {
            let asset = self.upload_file(file).await?;
            mapping.insert(
                format!("{}.png", stem(&asset.file_name)),
                asset.direct_link.clone(),
            );
            mapping.insert(asset.file_name.clone(), asset.direct_link.clone());
            if let Some(cb) = progress {
                cb.on_file_uploaded(i + 1, total, &asset.file_name, &asset.direct_link);
            }
        }

        let mapping_path = dir.join(MAPPING_FILE);
        mapping.save(&mapping_path)?;
        info!("URL mapping saved to {}", mapping_path.display());

        Ok(mapping)
    }
}

/// MIME type by file extension, defaulting to octet-stream.
fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
