use anyhow::Result;
use chrono::Utc;
use httpmock::prelude::*;
use pi_poster::adapters::render::CosmicRenderer;
use pi_poster::config::client_profile::ClientProfile;
use pi_poster::config::toml_config::RenderStyle;
use pi_poster::core::session_store::DEFAULT_SESSION_FILE;
use pi_poster::core::state_store::DEFAULT_STATE_FILE;
use pi_poster::domain::model::Credentials;
use pi_poster::{
    DigitLocator, InstagramClient, LocalStorage, PiPoster, PosterError, RunSettings, SessionInfo,
    SessionStore, StateStore, StopReason,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    server: MockServer,
}

impl Fixture {
    async fn new(digits: &str) -> Result<Self> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("pi.txt"), digits)?;
        Ok(Self {
            dir,
            server: MockServer::start_async().await,
        })
    }

    fn storage(&self) -> LocalStorage {
        LocalStorage::new(self.dir.path().to_str().unwrap().to_string())
    }

    async fn save_session(&self) -> Result<()> {
        let mut cookies = BTreeMap::new();
        cookies.insert("sessionid".to_string(), "s3ss".to_string());
        cookies.insert("csrftoken".to_string(), "tok123".to_string());
        let session = SessionInfo {
            last_login: Utc::now(),
            sessionid: Some("s3ss".to_string()),
            user_id: Some("4242".to_string()),
            csrf_token: Some("tok123".to_string()),
            login_successful: true,
            cookies,
        };
        SessionStore::new(self.storage(), DEFAULT_SESSION_FILE)
            .save(&session)
            .await?;
        Ok(())
    }

    async fn mock_account(&self, media_count: u64) {
        self.server
            .mock_async(|when, then| {
                when.method(GET).path("/pi_digits/");
                then.status(200).body(r#"{"profilePage_4242"}"#);
            })
            .await;
        self.server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/query");
                then.status(200)
                    .json_body(json!({"data": {"user": {"media_count": media_count}}}));
            })
            .await;
    }

    fn poster(
        &self,
        target_index: i64,
        max_posts: Option<usize>,
    ) -> Result<PiPoster<InstagramClient, DigitLocator, CosmicRenderer, LocalStorage>> {
        let client = InstagramClient::new(ClientProfile::for_base_url(self.server.base_url()))?;
        Ok(PiPoster::new(
            client,
            DigitLocator::new(self.dir.path().join("pi.txt")),
            CosmicRenderer::new(128, RenderStyle::Starfield).with_seed(7),
            SessionStore::new(self.storage(), DEFAULT_SESSION_FILE),
            StateStore::new(self.storage(), DEFAULT_STATE_FILE),
            RunSettings {
                username: "pi_digits".to_string(),
                credentials: Some(Credentials::new("pi_digits", "#PWD_INSTAGRAM_BROWSER:10:1:abc")),
                target_index,
                max_posts,
                post_delay: Duration::ZERO,
                jpeg_quality: 90,
            },
        ))
    }
}

#[tokio::test]
async fn test_run_publishes_next_digit_and_saves_state() -> Result<()> {
    let fixture = Fixture::new("3.14159").await?;
    fixture.save_session().await?;
    fixture.mock_account(3).await;

    let upload = fixture
        .server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/rupload_igphoto/fb_uploader_")
                .header("x-entity-type", "image/jpeg");
            then.status(200).json_body(json!({"status": "ok"}));
        })
        .await;
    let configure = fixture
        .server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/media/configure/")
                .x_www_form_urlencoded_tuple("caption", "The digit at index 2 is 4.");
            then.status(200)
                .json_body(json!({"status": "ok", "media": {"id": "1", "code": "A"}}));
        })
        .await;

    let summary = fixture.poster(10, Some(1))?.run().await?;

    upload.assert_async().await;
    configure.assert_async().await;
    assert_eq!(summary.stop, StopReason::PostLimit);
    assert_eq!(summary.posts.len(), 1);
    assert_eq!(summary.posts[0].index, 2);
    assert_eq!(summary.posts[0].receipt.media_code.as_deref(), Some("A"));

    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(fixture.dir.path().join(DEFAULT_STATE_FILE))?)?;
    assert_eq!(saved["last_index"], 2);
    assert_eq!(saved["target_index"], 10);
    Ok(())
}

#[tokio::test]
async fn test_run_stops_when_digits_run_out() -> Result<()> {
    let fixture = Fixture::new("3.14").await?;
    fixture.save_session().await?;
    fixture.mock_account(4).await;

    let upload = fixture
        .server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/rupload_igphoto/");
            then.status(200);
        })
        .await;

    let summary = fixture.poster(100, None)?.run().await?;

    assert_eq!(summary.stop, StopReason::SequenceExhausted);
    assert!(summary.posts.is_empty());
    upload.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_failed_publish_leaves_state_untouched() -> Result<()> {
    let fixture = Fixture::new("3.14159").await?;
    fixture.save_session().await?;
    fixture.mock_account(1).await;

    fixture
        .server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/rupload_igphoto/");
            then.status(200);
        })
        .await;
    fixture
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/media/configure/");
            then.status(200)
                .json_body(json!({"status": "fail", "message": "feedback_required"}));
        })
        .await;

    let result = fixture.poster(10, None)?.run().await;

    assert!(matches!(result, Err(PosterError::PublishFailed { .. })));
    assert!(!fixture.dir.path().join(DEFAULT_STATE_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_digit_file_is_reported() -> Result<()> {
    let fixture = Fixture::new("3.14159").await?;
    fixture.save_session().await?;
    fixture.mock_account(3).await;
    std::fs::remove_file(fixture.dir.path().join("pi.txt"))?;

    match fixture.poster(10, None)?.run().await {
        Err(e @ PosterError::ResourceUnavailable { .. }) => {
            assert_eq!(e.severity().exit_code(), 3);
        }
        other => panic!("expected ResourceUnavailable, got {:?}", other.map(|s| s.stop)),
    }
    Ok(())
}

#[tokio::test]
async fn test_dry_run_plans_without_publishing() -> Result<()> {
    let fixture = Fixture::new("3.14159").await?;
    fixture.save_session().await?;
    fixture.mock_account(0).await;

    let upload = fixture
        .server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/rupload_igphoto/");
            then.status(200);
        })
        .await;

    let plan = fixture
        .poster(10, None)?
        .dry_run()
        .await?
        .expect("a post should be planned");

    assert_eq!(plan.index, -1);
    assert_eq!(plan.caption, "Hello World!");
    upload.assert_hits_async(0).await;
    Ok(())
}
