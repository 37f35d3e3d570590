use super::{collect_cookies, headers, InstagramClient};
use crate::domain::model::{Credentials, SessionInfo};
use crate::utils::error::{PosterError, Result};
use chrono::Utc;
use reqwest::header::COOKIE;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

impl InstagramClient {
    pub(super) async fn login_flow(&self, credentials: &Credentials) -> Result<SessionInfo> {
        tracing::info!("Logging in as {}", credentials.username);
        tracing::debug!(
            "Using encrypted password ({} chars)",
            credentials.encrypted_password.len()
        );

        let profile = &self.profile;
        let mut jar: BTreeMap<String, String> = BTreeMap::new();

        let home = self
            .http
            .get(profile.web_url("/"))
            .headers(headers::document(profile)?)
            .send()
            .await?;
        tracing::debug!("Homepage status: {}", home.status());
        collect_cookies(&home, &mut jar);

        if profile.login_settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(profile.login_settle_ms)).await;
        }

        let login_page_url = profile.web_url("/?flo=true");
        let login_page = self
            .http
            .get(&login_page_url)
            .headers(headers::document(profile)?)
            .header(COOKIE, headers::cookie_header(profile, &jar))
            .send()
            .await?;
        tracing::debug!("Login page status: {}", login_page.status());
        if !login_page.status().is_success() {
            return Err(PosterError::LoginFailed {
                message: format!("login page returned {}", login_page.status()),
            });
        }
        collect_cookies(&login_page, &mut jar);

        let csrf_token = profile
            .csrf_token
            .clone()
            .or_else(|| jar.get("csrftoken").cloned());
        tracing::debug!(
            csrf = csrf_token.is_some(),
            mid = jar.contains_key("mid"),
            ig_did = jar.contains_key("ig_did"),
            "pre-login cookies"
        );

        let form = [
            ("enc_password", credentials.encrypted_password.as_str()),
            ("caaF2DebugGroup", "0"),
            ("isPrivacyPortalReq", "false"),
            ("loginAttemptSubmissionCount", "0"),
            ("optIntoOneTap", "false"),
            ("queryParams", r#"{"flo":"true"}"#),
            ("trustedDeviceRecords", "{}"),
            ("username", credentials.username.as_str()),
            ("jazoest", profile.jazoest.as_str()),
        ];

        let endpoint = profile.web_url("/api/v1/web/accounts/login/ajax/");
        let response = self
            .http
            .post(&endpoint)
            .headers(headers::ajax(profile, csrf_token.as_deref(), &login_page_url)?)
            .header(COOKIE, headers::cookie_header(profile, &jar))
            .form(&form)
            .send()
            .await?;
        tracing::debug!("Login response status: {}", response.status());
        collect_cookies(&response, &mut jar);

        let body: Value = response
            .json()
            .await
            .map_err(|e| PosterError::RemoteResponse {
                endpoint: endpoint.clone(),
                message: format!("invalid JSON: {}", e),
            })?;

        interpret_login(&body, jar, csrf_token)
    }
}

/// Turns the login endpoint's JSON answer into a session.
pub(crate) fn interpret_login(
    body: &Value,
    cookies: BTreeMap<String, String>,
    csrf_token: Option<String>,
) -> Result<SessionInfo> {
    if body.get("authenticated").and_then(Value::as_bool) == Some(true) {
        let sessionid = cookies
            .get("sessionid")
            .cloned()
            .ok_or_else(|| PosterError::LoginFailed {
                message: "no session token found in cookies".to_string(),
            })?;
        let user_id = body.get("userId").and_then(super::value_to_string);
        tracing::info!("Login successful (user id {})", user_id.as_deref().unwrap_or("?"));

        return Ok(SessionInfo {
            last_login: Utc::now(),
            sessionid: Some(sessionid),
            user_id,
            csrf_token: csrf_token.or_else(|| cookies.get("csrftoken").cloned()),
            login_successful: true,
            cookies,
        });
    }

    if body.get("message").and_then(Value::as_str) == Some("checkpoint_required") {
        let url = body
            .get("checkpoint_url")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        tracing::warn!("Checkpoint required: {}", url);
        return Err(PosterError::CheckpointRequired { url });
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    Err(PosterError::LoginFailed { message })
}
