use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a single digit lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitResult {
    Digit(char),
    /// The addressed position holds the separator (the decimal point).
    Separator,
    /// The addressed position lies outside the stored sequence.
    Absent,
}

impl DigitResult {
    /// Out-of-band value printed for the separator.
    pub const SENTINEL: i8 = -1;

    pub fn is_absent(&self) -> bool {
        matches!(self, DigitResult::Absent)
    }

    /// Numeric value of a digit result. Non-digit characters and the separator return `None`.
    pub fn value(&self) -> Option<u8> {
        match self {
            DigitResult::Digit(c) => c.to_digit(10).map(|d| d as u8),
            _ => None,
        }
    }
}

impl fmt::Display for DigitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigitResult::Digit(c) => write!(f, "{}", c),
            DigitResult::Separator => write!(f, "{}", Self::SENTINEL),
            DigitResult::Absent => write!(f, "none"),
        }
    }
}

/// Credentials used for a fresh login. The password is the browser-encrypted
/// `#PWD_INSTAGRAM_BROWSER:...` form, never plain text.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub encrypted_password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, encrypted_password: impl Into<String>) -> Self {
        Self {
            username: normalize_username(&username.into()),
            encrypted_password: encrypted_password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field(
                "encrypted_password",
                &format!("<{} chars>", self.encrypted_password.len()),
            )
            .finish()
    }
}

pub fn normalize_username(username: &str) -> String {
    username.trim().trim_start_matches('@').to_string()
}

/// Authenticated session as persisted under `session_info` in `login_details.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub last_login: DateTime<Utc>,
    pub sessionid: Option<String>,
    pub user_id: Option<String>,
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub login_successful: bool,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl SessionInfo {
    pub fn is_usable(&self) -> bool {
        self.login_successful && self.sessionid.is_some()
    }

    /// Human readable summary that never contains secret values.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Session ID: {}", mask(self.sessionid.as_deref())),
            format!("User ID: {}", self.user_id.as_deref().unwrap_or("N/A")),
            format!("CSRF Token: {}", mask(self.csrf_token.as_deref())),
            format!("Login Time: {}", self.last_login.to_rfc3339()),
            format!(
                "Status: {}",
                if self.login_successful { "Active" } else { "Inactive" }
            ),
        ];
        if !self.cookies.is_empty() {
            lines.push(format!("Cookies ({}):", self.cookies.len()));
            lines.extend(self.cookies.keys().map(|name| format!("  - {}", name)));
        }
        lines.join("\n")
    }
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(s) if s.chars().count() > 4 => format!("{}…", s.chars().take(4).collect::<String>()),
        Some(_) => "****".to_string(),
        None => "N/A".to_string(),
    }
}

/// Encoded image ready for upload.
#[derive(Debug, Clone)]
pub struct UploadImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    pub media_id: Option<String>,
    pub media_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub index: i64,
    pub receipt: PostReceipt,
}

/// Resumable loop counter: the last index that was published and the index to stop at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub last_index: i64,
    pub target_index: i64,
}

impl RunState {
    /// Nothing published yet; `-1` is the first postable index.
    pub const NOTHING_POSTED: i64 = -2;

    pub fn new(target_index: i64) -> Self {
        Self {
            last_index: Self::NOTHING_POSTED,
            target_index,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.last_index >= self.target_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    SequenceExhausted,
    PostLimit,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub posts: Vec<PublishedPost>,
    pub state: RunState,
    pub stop: StopReason,
}

/// What a dry run would publish next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPost {
    pub index: i64,
    pub digit: DigitResult,
    pub caption: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_result_display() {
        assert_eq!(DigitResult::Digit('7').to_string(), "7");
        assert_eq!(DigitResult::Separator.to_string(), "-1");
        assert_eq!(DigitResult::Absent.to_string(), "none");
        assert_eq!(DigitResult::Digit('7').value(), Some(7));
        assert_eq!(DigitResult::Separator.value(), None);
    }

    #[test]
    fn test_summary_hides_secrets() {
        let mut cookies = BTreeMap::new();
        cookies.insert("sessionid".to_string(), "super-secret-value".to_string());
        let session = SessionInfo {
            last_login: Utc::now(),
            sessionid: Some("super-secret-value".to_string()),
            user_id: Some("42".to_string()),
            csrf_token: Some("csrf-secret".to_string()),
            login_successful: true,
            cookies,
        };

        let summary = session.summary();
        assert!(!summary.contains("super-secret-value"));
        assert!(!summary.contains("csrf-secret"));
        assert!(summary.contains("sessionid"));
        assert!(summary.contains("42"));
    }

    #[test]
    fn test_credentials_strip_at_sign() {
        let creds = Credentials::new("@pi_digits", "#PWD_INSTAGRAM_BROWSER:10:1:abc");
        assert_eq!(creds.username, "pi_digits");
        assert!(!format!("{:?}", creds).contains("abc"));
    }

    #[test]
    fn test_run_state_completion() {
        let mut state = RunState::new(3);
        assert!(!state.is_complete());
        state.last_index = 3;
        assert!(state.is_complete());
    }
}
