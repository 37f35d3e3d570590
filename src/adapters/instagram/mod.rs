//! Web client for the photo-sharing service, speaking the same private
//! endpoints the browser front end uses.

mod auth;
mod headers;
mod profile;
mod publish;

use crate::config::client_profile::ClientProfile;
use crate::domain::model::{Credentials, PostReceipt, SessionInfo, UploadImage};
use crate::domain::ports::SocialClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::collections::BTreeMap;

pub struct InstagramClient {
    http: Client,
    profile: ClientProfile,
}

impl InstagramClient {
    pub fn new(profile: ClientProfile) -> Result<Self> {
        let http = Client::builder().timeout(profile.timeout()).build()?;
        Ok(Self { http, profile })
    }

    fn cookie_header(&self, session: &SessionInfo) -> String {
        headers::cookie_header(&self.profile, &session.cookies)
    }

    fn csrf_token<'a>(&'a self, session: &'a SessionInfo) -> Option<&'a str> {
        self.profile
            .csrf_token
            .as_deref()
            .or(session.csrf_token.as_deref())
    }
}

#[async_trait]
impl SocialClient for InstagramClient {
    async fn login(&self, credentials: &Credentials) -> Result<SessionInfo> {
        self.login_flow(credentials).await
    }

    async fn media_count(&self, session: &SessionInfo, username: &str) -> Result<u64> {
        self.media_count_for(session, username).await
    }

    async fn publish(
        &self,
        session: &SessionInfo,
        image: &UploadImage,
        caption: &str,
    ) -> Result<PostReceipt> {
        self.publish_image(session, image, caption).await
    }
}

fn collect_cookies(response: &Response, jar: &mut BTreeMap<String, String>) {
    for cookie in response.cookies() {
        jar.insert(cookie.name().to_string(), cookie.value().to_string());
    }
}

/// Ids arrive as either JSON strings or numbers depending on the endpoint.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
