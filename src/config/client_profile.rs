use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Browser fingerprint and endpoint settings for the remote client.
///
/// Every header value the web client sends comes from here, so a changed
/// front-end build only needs a config edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientProfile {
    pub base_url: String,
    pub upload_url: String,
    pub user_agent: String,
    pub app_id: String,
    /// Overrides the CSRF token obtained at login.
    pub csrf_token: Option<String>,
    /// Extra cookies merged into the session cookie set (session values win).
    pub cookies: BTreeMap<String, String>,
    pub instagram_ajax: String,
    pub asbd_id: String,
    pub www_claim: Option<String>,
    pub web_session_id: Option<String>,
    pub sec_ch_ua: String,
    pub sec_ch_ua_full_version_list: String,
    pub sec_ch_ua_platform: String,
    pub sec_ch_ua_platform_version: String,
    pub accept_language: String,
    pub profile_doc_id: String,
    pub jazoest: String,
    pub timeout_seconds: u64,
    pub login_settle_ms: u64,
    pub upload_settle_ms: u64,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            upload_url: "https://i.instagram.com".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36"
                .to_string(),
            app_id: "936619743392459".to_string(),
            csrf_token: None,
            cookies: BTreeMap::new(),
            instagram_ajax: "1023570583".to_string(),
            asbd_id: "359341".to_string(),
            www_claim: None,
            web_session_id: None,
            sec_ch_ua: r#""Chromium";v="136", "Brave";v="136", "Not.A/Brand";v="99""#.to_string(),
            sec_ch_ua_full_version_list:
                r#""Chromium";v="136.0.0.0", "Brave";v="136.0.0.0", "Not.A/Brand";v="99.0.0.0""#
                    .to_string(),
            sec_ch_ua_platform: r#""macOS""#.to_string(),
            sec_ch_ua_platform_version: r#""15.5.0""#.to_string(),
            accept_language: "en-US,en;q=0.6".to_string(),
            profile_doc_id: "9916454141777118".to_string(),
            jazoest: "22733".to_string(),
            timeout_seconds: 30,
            login_settle_ms: 2000,
            upload_settle_ms: 2000,
        }
    }
}

impl ClientProfile {
    /// Profile pointed at a different host for both web and upload endpoints.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            upload_url: base_url.clone(),
            base_url,
            login_settle_ms: 0,
            upload_settle_ms: 0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn web_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn upload_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.upload_url.trim_end_matches('/'), path)
    }
}

impl Validate for ClientProfile {
    fn validate(&self) -> Result<()> {
        validate_url("client.base_url", &self.base_url)?;
        validate_url("client.upload_url", &self.upload_url)?;
        validate_non_empty_string("client.user_agent", &self.user_agent)?;
        validate_non_empty_string("client.app_id", &self.app_id)?;
        validate_non_empty_string("client.profile_doc_id", &self.profile_doc_id)?;
        validate_range("client.timeout_seconds", self.timeout_seconds, 1, 600)?;
        Ok(())
    }
}
