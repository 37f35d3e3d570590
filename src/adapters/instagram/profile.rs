use super::{headers, InstagramClient};
use crate::domain::model::SessionInfo;
use crate::utils::error::{PosterError, Result};
use regex::Regex;
use reqwest::header::COOKIE;
use serde_json::Value;

impl InstagramClient {
    /// Resolves the numeric account id for `username`: profile page first, then account search.
    pub async fn resolve_user_id(&self, session: &SessionInfo, username: &str) -> Result<String> {
        match self.user_id_from_profile_page(session, username).await {
            Ok(Some(id)) => return Ok(id),
            Ok(None) => tracing::debug!("No user id in profile page for @{}", username),
            Err(e) => tracing::warn!("Profile page lookup failed for @{}: {}", username, e),
        }

        match self.user_id_from_search(session, username).await {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(PosterError::UserNotFound {
                username: username.to_string(),
            }),
            Err(e) => {
                tracing::warn!("Search lookup failed for @{}: {}", username, e);
                Err(PosterError::UserNotFound {
                    username: username.to_string(),
                })
            }
        }
    }

    async fn user_id_from_profile_page(
        &self,
        session: &SessionInfo,
        username: &str,
    ) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.profile.web_url(&format!("/{}/", username)))
            .headers(headers::document(&self.profile)?)
            .header(COOKIE, self.cookie_header(session))
            .send()
            .await?
            .error_for_status()?;

        let content = response.text().await?;
        Ok(find_user_id_in_page(&content, username))
    }

    async fn user_id_from_search(
        &self,
        session: &SessionInfo,
        username: &str,
    ) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.profile.web_url("/web/search/topsearch/"))
            .query(&[("query", username), ("context", "blended")])
            .headers(headers::search(&self.profile, self.csrf_token(session))?)
            .header(COOKIE, self.cookie_header(session))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(find_user_id_in_search(&body, username))
    }

    pub(super) async fn media_count_for(&self, session: &SessionInfo, username: &str) -> Result<u64> {
        let user_id = self.resolve_user_id(session, username).await?;
        tracing::debug!("Resolved @{} to user id {}", username, user_id);

        let variables = serde_json::json!({ "id": user_id, "render_surface": "PROFILE" });
        let variables = variables.to_string();
        let form = [
            ("variables", variables.as_str()),
            ("doc_id", self.profile.profile_doc_id.as_str()),
        ];

        let endpoint = self.profile.web_url("/graphql/query");
        let referer = self.profile.web_url(&format!("/{}/", username));
        let response = self
            .http
            .post(&endpoint)
            .headers(headers::graphql(&self.profile, self.csrf_token(session), &referer)?)
            .header(COOKIE, self.cookie_header(session))
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        media_count_from(&body).ok_or_else(|| PosterError::RemoteResponse {
            endpoint,
            message: "data.user.media_count missing from profile query".to_string(),
        })
    }
}

pub(crate) fn media_count_from(body: &Value) -> Option<u64> {
    body.pointer("/data/user/media_count").and_then(Value::as_u64)
}

/// Scans profile page HTML for the account id.
pub(crate) fn find_user_id_in_page(content: &str, username: &str) -> Option<String> {
    let name = regex::escape(username);
    let patterns = [
        r#""profilePage_(\d+)""#.to_string(),
        format!(r#""id":"(\d+)".*?"username":"{}""#, name),
        r#""owner":\{"id":"(\d+)""#.to_string(),
        r#""user_id":"(\d+)""#.to_string(),
        format!(r#""pk":(\d+).*?"username":"{}""#, name),
    ];

    for pattern in &patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if let Some(caps) = re.captures(content) {
            return Some(caps[1].to_string());
        }
    }

    let shared = Regex::new(r"window\._sharedData\s*=\s*(\{.*?\});").ok()?;
    let caps = shared.captures(content)?;
    let data: Value = serde_json::from_str(&caps[1]).ok()?;
    data.pointer("/entry_data/ProfilePage/0/graphql/user/id")
        .and_then(super::value_to_string)
}

pub(crate) fn find_user_id_in_search(body: &Value, username: &str) -> Option<String> {
    body.get("users")?
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("user"))
        .find(|user| user.get("username").and_then(Value::as_str) == Some(username))
        .and_then(|user| user.get("pk"))
        .and_then(super::value_to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_page_patterns() {
        let page = r#"<script>{"profilePage_25025320"}</script>"#;
        assert_eq!(find_user_id_in_page(page, "pi").as_deref(), Some("25025320"));

        let page = r#"{"id":"99","full_name":"x","username":"pi_digits"}"#;
        assert_eq!(find_user_id_in_page(page, "pi_digits").as_deref(), Some("99"));

        let page = r#"{"pk":1234,"username":"pi.digits"}"#;
        assert_eq!(find_user_id_in_page(page, "pi.digits").as_deref(), Some("1234"));
    }

    #[test]
    fn test_profile_page_shared_data() {
        let page = r#"<script>window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":{"user":{"id":"4242"}}}]}};</script>"#;
        assert_eq!(find_user_id_in_page(page, "pi").as_deref(), Some("4242"));
    }

    #[test]
    fn test_profile_page_without_id() {
        assert_eq!(find_user_id_in_page("<html></html>", "pi"), None);
    }

    #[test]
    fn test_search_results() {
        let body = json!({
            "users": [
                {"user": {"username": "pi_digits_fan", "pk": 1}},
                {"user": {"username": "pi_digits", "pk": 2}}
            ]
        });
        assert_eq!(find_user_id_in_search(&body, "pi_digits").as_deref(), Some("2"));
        assert_eq!(find_user_id_in_search(&body, "nobody"), None);
        assert_eq!(find_user_id_in_search(&json!({}), "pi_digits"), None);
    }

    #[test]
    fn test_media_count_from() {
        assert_eq!(
            media_count_from(&json!({"data": {"user": {"media_count": 17}}})),
            Some(17)
        );
        assert_eq!(media_count_from(&json!({"data": {"user": {}}})), None);
    }
}
