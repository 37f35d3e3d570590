use super::{headers, InstagramClient};
use crate::domain::model::{PostReceipt, SessionInfo, UploadImage};
use crate::utils::error::{PosterError, Result};
use chrono::Utc;
use reqwest::header::COOKIE;
use serde_json::Value;
use std::time::Duration;

impl InstagramClient {
    pub(super) async fn publish_image(
        &self,
        session: &SessionInfo,
        image: &UploadImage,
        caption: &str,
    ) -> Result<PostReceipt> {
        let upload_id = Utc::now().timestamp_millis().to_string();
        tracing::info!(upload_id = %upload_id, bytes = image.bytes.len(), "Uploading image");

        self.upload(session, &upload_id, image).await?;

        if self.profile.upload_settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.profile.upload_settle_ms)).await;
        }

        self.configure(session, &upload_id, caption).await
    }

    async fn upload(&self, session: &SessionInfo, upload_id: &str, image: &UploadImage) -> Result<()> {
        let endpoint = self
            .profile
            .upload_endpoint(&format!("/rupload_igphoto/fb_uploader_{}", upload_id));
        let response = self
            .http
            .post(&endpoint)
            .headers(headers::upload(&self.profile, upload_id, image)?)
            .header(COOKIE, self.cookie_header(session))
            .body(image.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Upload status: {}", status);
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(PosterError::UploadFailed {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn configure(&self, session: &SessionInfo, upload_id: &str, caption: &str) -> Result<PostReceipt> {
        tracing::info!("Configuring post with caption: '{}'", caption);

        let form = [
            ("archive_only", "false"),
            ("caption", caption),
            ("clips_share_preview_to_feed", "1"),
            ("disable_comments", "0"),
            ("disable_oa_reuse", "false"),
            ("igtv_share_preview_to_feed", "1"),
            ("is_meta_only_post", "0"),
            ("is_unified_video", "1"),
            ("like_and_view_counts_disabled", "0"),
            ("media_share_flow", "creation_flow"),
            ("share_to_facebook", ""),
            ("share_to_fb_destination_type", "USER"),
            ("source_type", "library"),
            ("upload_id", upload_id),
            ("video_subtitles_enabled", "0"),
            ("jazoest", self.profile.jazoest.as_str()),
        ];

        let endpoint = self.profile.web_url("/api/v1/media/configure/");
        let referer = self.profile.web_url("/");
        let response = self
            .http
            .post(&endpoint)
            .headers(headers::ajax(&self.profile, self.csrf_token(session), &referer)?)
            .header(COOKIE, self.cookie_header(session))
            .form(&form)
            .send()
            .await?;
        tracing::debug!("Configure status: {}", response.status());

        let body: Value = response
            .json()
            .await
            .map_err(|e| PosterError::RemoteResponse {
                endpoint: endpoint.clone(),
                message: format!("invalid JSON: {}", e),
            })?;

        interpret_configure(&body)
    }
}

pub(crate) fn interpret_configure(body: &Value) -> Result<PostReceipt> {
    if body.get("status").and_then(Value::as_str) != Some("ok") {
        return Err(PosterError::PublishFailed {
            message: body.to_string(),
        });
    }

    let media = body.get("media");
    let receipt = PostReceipt {
        media_id: media
            .and_then(|m| m.get("id"))
            .and_then(super::value_to_string),
        media_code: media
            .and_then(|m| m.get("code"))
            .and_then(super::value_to_string),
    };
    tracing::info!(
        "Post published (media id {}, code {})",
        receipt.media_id.as_deref().unwrap_or("?"),
        receipt.media_code.as_deref().unwrap_or("?")
    );
    Ok(receipt)
}
