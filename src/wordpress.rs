//! WordPress REST API client: categories, tags, posts, and post meta.
//!
//! Authentication is an application password sent as a precomputed Basic
//! auth header — computed once in [`WordPressClient::new`] so request code
//! never touches the raw credentials.
//!
//! Two plugin conventions are baked in, matching the target site:
//!
//! * **Featured image** — the FIFU plugin reads `fifu_image_url` /
//!   `_thumbnail_ext_url` post meta instead of a media-library attachment,
//!   which is what lets posts use Drive-hosted images as thumbnails.
//! * **SEO** — Rank Math reads `rank_math_focus_keyword` /
//!   `rank_math_description` post meta.
//!
//! Category and tag resolution is get-or-create by exact name, so repeated
//! runs never duplicate taxonomy terms even though posts themselves are
//! created fresh each run.

use crate::config::WordPressCredentials;
use crate::error::Md2PressError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Visibility of a created post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Publish,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields for creating a post.
#[derive(Debug, Serialize)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<&'a str>,
}

/// The authenticated account, as returned by the connection check.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    pub slug: String,
}

/// A taxonomy term (category or tag).
#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    pub id: u64,
    pub name: String,
}

/// A created post's identity.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPost {
    pub id: u64,
    pub link: String,
}

/// WordPress REST v2 client.
pub struct WordPressClient {
    http: reqwest::Client,
    api_url: String,
    auth_header: String,
}

impl WordPressClient {
    /// Build a client from explicit credentials.
    pub fn new(
        credentials: &WordPressCredentials,
        timeout_secs: u64,
    ) -> Result<Self, Md2PressError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Md2PressError::Internal(format!("HTTP client build failed: {e}")))?;

        let encoded = STANDARD.encode(format!(
            "{}:{}",
            credentials.username, credentials.app_password
        ));

        Ok(Self {
            http,
            api_url: format!("{}/wp-json/wp/v2", credentials.site_url),
            auth_header: format!("Basic {encoded}"),
        })
    }

    /// Verify the credentials by fetching the authenticated user.
    ///
    /// # Errors
    /// [`Md2PressError::ConnectionFailed`] on any failure — the publish
    /// stage treats this as fatal to itself.
    pub async fn check_connection(&self) -> Result<Account, Md2PressError> {
        let endpoint = format!("{}/users/me", self.api_url);
        let response = self
            .http
            .get(&endpoint)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .map_err(|e| Md2PressError::ConnectionFailed {
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Md2PressError::ConnectionFailed {
                detail: format!("HTTP {}", response.status()),
            });
        }

        let account: Account =
            response
                .json()
                .await
                .map_err(|e| Md2PressError::ConnectionFailed {
                    detail: format!("malformed user response: {e}"),
                })?;
        info!("Connected as: {} ({})", account.name, account.slug);
        Ok(account)
    }

    /// List categories (first 100 — the site has far fewer).
    pub async fn get_categories(&self) -> Result<Vec<Term>, Md2PressError> {
        self.get_terms("categories").await
    }

    /// Resolve a category id by name, creating the category on miss.
    pub async fn get_or_create_category(&self, name: &str) -> Result<u64, Md2PressError> {
        if let Some(existing) = self
            .get_categories()
            .await?
            .into_iter()
            .find(|c| c.name == name)
        {
            debug!("Category '{}' exists (id {})", name, existing.id);
            return Ok(existing.id);
        }

        let created = self.create_term("categories", name).await?;
        info!("Created category '{}' (id {})", name, created.id);
        Ok(created.id)
    }

    /// List tags (first 100).
    pub async fn get_tags(&self) -> Result<Vec<Term>, Md2PressError> {
        self.get_terms("tags").await
    }

    /// Resolve tag ids by name, creating missing tags.
    ///
    /// A tag that fails to create is skipped with a warning rather than
    /// failing the whole post — matching categories' lookup-then-create
    /// idempotency without letting one race ruin the publish.
    pub async fn get_or_create_tags(&self, names: &[String]) -> Result<Vec<u64>, Md2PressError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let existing = self.get_tags().await?;

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            if let Some(tag) = existing.iter().find(|t| &t.name == name) {
                ids.push(tag.id);
                continue;
            }
            match self.create_term("tags", name).await {
                Ok(tag) => ids.push(tag.id),
                Err(e) => warn!("Skipping tag '{}': {}", name, e),
            }
        }
        Ok(ids)
    }

    /// Create a post and return its id and canonical URL.
    pub async fn create_post(&self, post: &NewPost<'_>) -> Result<CreatedPost, Md2PressError> {
        let endpoint = format!("{}/posts", self.api_url);
        let response = self
            .http
            .post(&endpoint)
            .header("Authorization", &self.auth_header)
            .json(post)
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

        let created: CreatedPost = response.json().await.map_err(|e| {
            Md2PressError::Internal(format!("malformed create-post response: {e}"))
        })?;
        info!("Post created: {} (ID: {})", created.link, created.id);
        Ok(created)
    }

    /// Point the post's featured image at an external URL via FIFU meta.
    pub async fn set_featured_image(
        &self,
        post_id: u64,
        image_url: &str,
    ) -> Result<(), Md2PressError> {
        self.update_post_meta(
            post_id,
            serde_json::json!({
                "fifu_image_url": image_url,
                "_thumbnail_ext_url": image_url,
            }),
        )
        .await?;
        info!("Featured image set: {}", image_url);
        Ok(())
    }

    /// Write the Rank Math focus keyword (and optional meta description).
    pub async fn set_seo_meta(
        &self,
        post_id: u64,
        focus_keyword: &str,
        description: Option<&str>,
    ) -> Result<(), Md2PressError> {
        let mut meta = serde_json::json!({ "rank_math_focus_keyword": focus_keyword });
        if let Some(desc) = description {
            meta["rank_math_description"] = serde_json::Value::String(desc.to_string());
        }
        self.update_post_meta(post_id, meta).await?;
        info!("Focus keyword set: {}", focus_keyword);
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn get_terms(&self, taxonomy: &str) -> Result<Vec<Term>, Md2PressError> {
        let endpoint = format!("{}/{}", self.api_url, taxonomy);
        let response = self
            .http
            .get(&endpoint)
            .header("Authorization", &self.auth_header)
            .query(&[("per_page", "100")])
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

        response
            .json()
            .await
            .map_err(|e| Md2PressError::Internal(format!("malformed {taxonomy} response: {e}")))
    }

    async fn create_term(&self, taxonomy: &str, name: &str) -> Result<Term, Md2PressError> {
        let endpoint = format!("{}/{}", self.api_url, taxonomy);
        let response = self
            .http
            .post(&endpoint)
            .header("Authorization", &self.auth_header)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|source| Md2PressError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;

        // Term creation answers 201; anything else is a failure.
        if response.status().as_u16() != 201 {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Md2PressError::Api {
                endpoint,
                status,
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Md2PressError::Internal(format!("malformed {taxonomy} response: {e}")))
    }

    async fn update_post_meta(
        &self,
        post_id: u64,
        meta: serde_json::Value,
    ) -> Result<(), Md2PressError> {
        let endpoint = format!("{}/posts/{}", self.api_url, post_id);
        let response = self
            .http
            .post(&endpoint)
            .header("Authorization", &self.auth_header)
            .json(&serde_json::json!({ "meta": meta }))
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
}
