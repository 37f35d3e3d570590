//! Header tables for each kind of request the web client makes.

use crate::config::client_profile::ClientProfile;
use crate::domain::model::UploadImage;
use crate::utils::error::{PosterError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

struct Headers(HeaderMap);

impl Headers {
    fn new() -> Self {
        Self(HeaderMap::new())
    }

    fn set(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| PosterError::config(format!("invalid header name {}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| PosterError::config(format!("invalid value for header {}: {}", name, e)))?;
        self.0.insert(header_name, header_value);
        Ok(self)
    }

    fn set_opt(self, name: &str, value: Option<&str>) -> Result<Self> {
        match value {
            Some(value) => self.set(name, value),
            None => Ok(self),
        }
    }

    fn client_hints(self, profile: &ClientProfile) -> Result<Self> {
        self.set("sec-ch-ua", &profile.sec_ch_ua)?
            .set("sec-ch-ua-mobile", "?0")?
            .set("sec-ch-ua-platform", &profile.sec_ch_ua_platform)
    }
}

/// Top-level page navigation, as a browser opening the site.
pub(crate) fn document(profile: &ClientProfile) -> Result<HeaderMap> {
    Ok(Headers::new()
        .set("User-Agent", &profile.user_agent)?
        .set(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        )?
        .set("Accept-Language", &profile.accept_language)?
        .client_hints(profile)?
        .set("Sec-Fetch-Dest", "document")?
        .set("Sec-Fetch-Mode", "navigate")?
        .set("Sec-Fetch-Site", "none")?
        .set("Sec-Fetch-User", "?1")?
        .set("Upgrade-Insecure-Requests", "1")?
        .0)
}

/// Same-origin XHR form posts (login and media configure).
pub(crate) fn ajax(profile: &ClientProfile, csrf_token: Option<&str>, referer: &str) -> Result<HeaderMap> {
    Ok(Headers::new()
        .set("User-Agent", &profile.user_agent)?
        .set("Accept", "*/*")?
        .set("Accept-Language", &profile.accept_language)?
        .set("sec-ch-ua-full-version-list", &profile.sec_ch_ua_full_version_list)?
        .set("sec-ch-ua-model", "\"\"")?
        .set("sec-ch-ua-platform-version", &profile.sec_ch_ua_platform_version)?
        .client_hints(profile)?
        .set("X-IG-App-ID", &profile.app_id)?
        .set("X-Requested-With", "XMLHttpRequest")?
        .set("X-Instagram-AJAX", &profile.instagram_ajax)?
        .set("X-ASBD-ID", &profile.asbd_id)?
        .set_opt("X-CSRFToken", csrf_token)?
        .set_opt("X-Web-Session-ID", profile.web_session_id.as_deref())?
        .set_opt("X-IG-WWW-Claim", profile.www_claim.as_deref())?
        .set("Sec-GPC", "1")?
        .set("Origin", profile.base_url.trim_end_matches('/'))?
        .set("Referer", referer)?
        .set("Sec-Fetch-Site", "same-origin")?
        .set("Sec-Fetch-Mode", "cors")?
        .set("Sec-Fetch-Dest", "empty")?
        .0)
}

/// Profile GraphQL query used to read the media count.
pub(crate) fn graphql(
    profile: &ClientProfile,
    csrf_token: Option<&str>,
    referer: &str,
) -> Result<HeaderMap> {
    Ok(Headers::new()
        .set("User-Agent", &profile.user_agent)?
        .set("Accept", "*/*")?
        .set("Accept-Language", &profile.accept_language)?
        .set("Origin", profile.base_url.trim_end_matches('/'))?
        .set("Referer", referer)?
        .set("Sec-Fetch-Dest", "empty")?
        .set("Sec-Fetch-Mode", "cors")?
        .set("Sec-Fetch-Site", "same-origin")?
        .set_opt("X-CSRFToken", csrf_token)?
        .set("X-FB-Friendly-Name", "PolarisProfilePageContentQuery")?
        .set("X-IG-App-ID", &profile.app_id)?
        .0)
}

/// Account search fallback used when the profile page does not expose the user id.
pub(crate) fn search(profile: &ClientProfile, csrf_token: Option<&str>) -> Result<HeaderMap> {
    Ok(Headers::new()
        .set("User-Agent", &profile.user_agent)?
        .set_opt("X-CSRFToken", csrf_token)?
        .set("X-IG-App-ID", &profile.app_id)?
        .set("X-Requested-With", "XMLHttpRequest")?
        .set("Referer", &profile.web_url("/"))?
        .0)
}

/// Resumable-upload headers for the raw image body.
pub(crate) fn upload(profile: &ClientProfile, upload_id: &str, image: &UploadImage) -> Result<HeaderMap> {
    let rupload_params = serde_json::json!({
        "media_type": 1,
        "upload_id": upload_id,
        "upload_media_height": image.height,
        "upload_media_width": image.width,
    });

    Ok(Headers::new()
        .set("User-Agent", &profile.user_agent)?
        .set("Accept", "*/*")?
        .set("Accept-Language", &profile.accept_language)?
        .client_hints(profile)?
        .set("X-Instagram-Rupload-Params", &rupload_params.to_string())?
        .set("X-Instagram-AJAX", &profile.instagram_ajax)?
        .set_opt("X-Web-Session-ID", profile.web_session_id.as_deref())?
        .set("X-IG-App-ID", &profile.app_id)?
        .set("X-ASBD-ID", &profile.asbd_id)?
        .set("Offset", "0")?
        .set("X-Entity-Length", &image.bytes.len().to_string())?
        .set("X-Entity-Type", &image.mime_type)?
        .set("X-Entity-Name", &format!("fb_uploader_{}", upload_id))?
        .set("Content-Type", &image.mime_type)?
        .set("Sec-GPC", "1")?
        .set("Origin", profile.base_url.trim_end_matches('/'))?
        .set("Referer", &profile.web_url("/"))?
        .set("Sec-Fetch-Site", "same-site")?
        .set("Sec-Fetch-Mode", "cors")?
        .set("Sec-Fetch-Dest", "empty")?
        .0)
}

/// `Cookie` header value: profile cookies overlaid with the session's own.
pub(crate) fn cookie_header(profile: &ClientProfile, session_cookies: &BTreeMap<String, String>) -> String {
    let mut merged = profile.cookies.clone();
    merged.extend(session_cookies.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
