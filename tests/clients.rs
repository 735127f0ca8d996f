//! Collaborator client tests against a mocked HTTP server.
//!
//! Exercises the WordPress and Drive clients end-to-end at the HTTP layer:
//! auth headers, endpoint shapes, payloads, and error mapping — everything
//! short of the real services.

use md2press::{
    DriveCredentials, DriveEndpoints, DriveUploader, Md2PressError, NewPost, PostStatus,
    WordPressClient, WordPressCredentials, MAPPING_FILE,
};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wp_client(server: &MockServer) -> WordPressClient {
    let creds = WordPressCredentials::new(server.uri(), "editor", "secret");
    WordPressClient::new(&creds, 10).expect("client builds")
}

// base64("editor:secret")
const EDITOR_AUTH: &str = "Basic ZWRpdG9yOnNlY3JldA==";

// ── WordPress: connection ────────────────────────────────────────────────

#[tokio::test]
async fn connection_check_returns_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .and(header("Authorization", EDITOR_AUTH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"name": "Editor", "slug": "editor"})),
        )
        .mount(&server)
        .await;

    let account = wp_client(&server).check_connection().await.expect("connects");
    assert_eq!(account.name, "Editor");
    assert_eq!(account.slug, "editor");
}

#[tokio::test]
async fn connection_check_maps_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = wp_client(&server).check_connection().await.unwrap_err();
    assert!(matches!(err, Md2PressError::ConnectionFailed { .. }));
}

// ── WordPress: taxonomy ──────────────────────────────────────────────────

#[tokio::test]
async fn existing_category_is_not_recreated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!([{"id": 7, "name": "최신 치과교정학 연구"}]),
        ))
        .mount(&server)
        .await;
    // No POST mock mounted: a create attempt would 404 and fail the test.

    let id = wp_client(&server)
        .get_or_create_category("최신 치과교정학 연구")
        .await
        .expect("category resolves");
    assert_eq!(id, 7);
}

#[tokio::test]
async fn missing_category_is_created() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(body_partial_json(serde_json::json!({"name": "New"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 12, "name": "New"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let id = wp_client(&server)
        .get_or_create_category("New")
        .await
        .expect("category created");
    assert_eq!(id, 12);
}

#[tokio::test]
async fn tags_mix_existing_and_created() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": 3, "name": "투명교정"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(body_partial_json(serde_json::json!({"name": "교정"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 9, "name": "교정"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ids = wp_client(&server)
        .get_or_create_tags(&["투명교정".to_string(), "교정".to_string()])
        .await
        .expect("tags resolve");
    assert_eq!(ids, vec![3, 9]);
}

#[tokio::test]
async fn empty_tag_list_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let ids = wp_client(&server).get_or_create_tags(&[]).await.unwrap();
    assert!(ids.is_empty());
}

// ── WordPress: posts and meta ────────────────────────────────────────────

#[tokio::test]
async fn create_post_sends_payload_and_parses_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(header("Authorization", EDITOR_AUTH))
        .and(body_partial_json(serde_json::json!({
            "title": "제목",
            "status": "draft",
            "categories": [7],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            serde_json::json!({"id": 101, "link": "https://blog.example.com/?p=101"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let created = wp_client(&server)
        .create_post(&NewPost {
            title: "제목",
            content: "<p>본문</p>",
            status: PostStatus::Draft,
            categories: vec![7],
            tags: vec![3],
            excerpt: Some("요약"),
        })
        .await
        .expect("post created");
    assert_eq!(created.id, 101);
    assert_eq!(created.link, "https://blog.example.com/?p=101");
}

#[tokio::test]
async fn create_post_surfaces_api_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(403).set_body_string("rest_cannot_create"))
        .mount(&server)
        .await;

    let err = wp_client(&server)
        .create_post(&NewPost {
            title: "t",
            content: "c",
            status: PostStatus::Publish,
            categories: vec![],
            tags: vec![],
            excerpt: None,
        })
        .await
        .unwrap_err();
    match err {
        Md2PressError::Api { status, body, .. } => {
            assert_eq!(status, 403);
            assert!(body.contains("rest_cannot_create"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn featured_image_writes_fifu_meta() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts/101"))
        .and(body_partial_json(serde_json::json!({
            "meta": {
                "fifu_image_url": "https://lh3.example/d/abc",
                "_thumbnail_ext_url": "https://lh3.example/d/abc",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 101})))
        .expect(1)
        .mount(&server)
        .await;

    wp_client(&server)
        .set_featured_image(101, "https://lh3.example/d/abc")
        .await
        .expect("meta written");
}

#[tokio::test]
async fn seo_meta_includes_description_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts/101"))
        .and(body_partial_json(serde_json::json!({
            "meta": {
                "rank_math_focus_keyword": "투명교정",
                "rank_math_description": "요약문",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 101})))
        .expect(1)
        .mount(&server)
        .await;

    wp_client(&server)
        .set_seo_meta(101, "투명교정", Some("요약문"))
        .await
        .expect("meta written");
}

// ── Drive uploader ───────────────────────────────────────────────────────

fn drive_creds() -> DriveCredentials {
    DriveCredentials {
        client_id: "cid".into(),
        client_secret: "cs".into(),
        refresh_token: "rt".into(),
        folder_id: Some("folder123".into()),
    }
}

async fn mount_drive_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "at-token"})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(header("Authorization", "Bearer at-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"id": "file-abc", "name": "x.webp", "webViewLink": "https://drive.example/view"}),
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/drive/v3/files/[^/]+/permissions$"))
        .and(body_partial_json(
            serde_json::json!({"role": "reader", "type": "anyone"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "perm"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_file_returns_direct_link() {
    let server = MockServer::start().await;
    mount_drive_mocks(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("fig1.webp");
    std::fs::write(&file, b"RIFF....WEBP").unwrap();

    let uploader = DriveUploader::connect(
        drive_creds(),
        DriveEndpoints::with_base(&server.uri()),
        10,
    )
    .await
    .expect("token exchange succeeds");

    let asset = uploader.upload_file(&file).await.expect("upload succeeds");
    assert_eq!(asset.file_id, "file-abc");
    assert_eq!(asset.file_name, "fig1.webp");
    assert_eq!(asset.direct_link, format!("{}/d/file-abc", server.uri()));
    assert_eq!(asset.web_view_link.as_deref(), Some("https://drive.example/view"));
}

#[tokio::test]
async fn upload_directory_builds_dual_key_mapping_and_persists_it() {
    let server = MockServer::start().await;
    mount_drive_mocks(&server).await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fig1.webp"), b"webp1").unwrap();
    std::fs::write(dir.path().join("page.webp"), b"webp2").unwrap();
    // Only *.webp is swept; strays are ignored.
    std::fs::write(dir.path().join("fig1.png"), b"png").unwrap();

    let uploader = DriveUploader::connect(
        drive_creds(),
        DriveEndpoints::with_base(&server.uri()),
        10,
    )
    .await
    .unwrap();

    let mapping = uploader
        .upload_directory(dir.path(), None)
        .await
        .expect("directory upload succeeds");

    // Two files, keyed under both the PNG and the WebP name.
    assert_eq!(mapping.len(), 4);
    let link = format!("{}/d/file-abc", server.uri());
    assert_eq!(mapping.get("fig1.png"), Some(link.as_str()));
    assert_eq!(mapping.get("fig1.webp"), Some(link.as_str()));
    assert_eq!(mapping.get("page.png"), Some(link.as_str()));
    assert_eq!(mapping.get("page.webp"), Some(link.as_str()));

    // The mapping artifact is persisted beside the assets.
    let persisted = md2press::UrlMapping::load(&dir.path().join(MAPPING_FILE)).unwrap();
    assert_eq!(persisted, mapping);
}

#[tokio::test]
async fn rejected_token_exchange_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let err = DriveUploader::connect(
        drive_creds(),
        DriveEndpoints::with_base(&server.uri()),
        10,
    )
    .await
    .unwrap_err();
    match err {
        Md2PressError::TokenExchange { reason } => assert!(reason.contains("invalid_grant")),
        other => panic!("expected TokenExchange, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_upload_is_typed_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "at-token"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("fig1.webp");
    std::fs::write(&file, b"bytes").unwrap();

    let uploader = DriveUploader::connect(
        drive_creds(),
        DriveEndpoints::with_base(&server.uri()),
        10,
    )
    .await
    .unwrap();

    let err = uploader.upload_file(&file).await.unwrap_err();
    match err {
        Md2PressError::Api { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Api error, got {other:?}"),
    }
}
