use crate::config::client_profile::ClientProfile;
use crate::core::session_store::DEFAULT_SESSION_FILE;
use crate::core::state_store::DEFAULT_STATE_FILE;
use crate::domain::model::{normalize_username, Credentials};
use crate::utils::error::{PosterError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "pi-poster.toml";
pub const USERNAME_ENV: &str = "INSTAGRAM_USERNAME";
pub const ENCRYPTED_PASSWORD_ENV: &str = "INSTAGRAM_ENCRYPTED_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub account: AccountConfig,
    #[serde(default)]
    pub digits: DigitsConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub client: ClientProfile,
    #[serde(default)]
    pub render: RenderConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    pub encrypted_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitsConfig {
    pub path: String,
    pub separator: char,
}

impl Default for DigitsConfig {
    fn default() -> Self {
        Self {
            path: "pi.txt".to_string(),
            separator: '.',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub target_index: i64,
    /// Directory holding the session and state files.
    pub data_dir: String,
    pub session_file: String,
    pub state_file: String,
    pub post_delay_seconds: u64,
    pub max_posts: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_index: 229,
            data_dir: ".".to_string(),
            session_file: DEFAULT_SESSION_FILE.to_string(),
            state_file: DEFAULT_STATE_FILE.to_string(),
            post_delay_seconds: 0,
            max_posts: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    #[default]
    Starfield,
    Gradient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub size: u32,
    pub style: RenderStyle,
    pub jpeg_quality: u8,
    pub seed: Option<u64>,
    pub output_dir: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: 1080,
            style: RenderStyle::Starfield,
            jpeg_quality: 95,
            seed: None,
            output_dir: "digits".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PosterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when it exists, otherwise builds a default config from the environment.
    pub fn load_or_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "{} not found, using environment configuration",
                path.as_ref().display()
            );
            Self::from_env()
        }
    }

    pub fn from_env() -> Result<Self> {
        let username = std::env::var(USERNAME_ENV).map_err(|_| PosterError::MissingConfigError {
            field: USERNAME_ENV.to_string(),
        })?;
        Ok(Self {
            account: AccountConfig {
                username,
                encrypted_password: std::env::var(ENCRYPTED_PASSWORD_ENV).ok(),
            },
            digits: DigitsConfig::default(),
            run: RunConfig::default(),
            client: ClientProfile::default(),
            render: RenderConfig::default(),
            monitoring: None,
        })
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PosterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INSTAGRAM_USERNAME})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| PosterError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn username(&self) -> String {
        normalize_username(&self.account.username)
    }

    /// Credentials for a fresh login. Fails when no encrypted password was configured.
    pub fn credentials(&self) -> Result<Credentials> {
        let password = validate_required_field(
            "account.encrypted_password",
            &self.account.encrypted_password,
        )?;
        if password.trim().is_empty() || is_unresolved(password) {
            return Err(PosterError::MissingConfigError {
                field: format!("account.encrypted_password ({})", ENCRYPTED_PASSWORD_ENV),
            });
        }
        Ok(Credentials::new(self.username(), password.clone()))
    }

    pub fn separator_byte(&self) -> Result<u8> {
        let separator = self.digits.separator;
        if separator.is_ascii() {
            Ok(separator as u8)
        } else {
            Err(PosterError::InvalidConfigValueError {
                field: "digits.separator".to_string(),
                value: separator.to_string(),
                reason: "Separator must be a single ASCII character".to_string(),
            })
        }
    }

    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.run.post_delay_seconds)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("account.username", &self.username())?;
        if is_unresolved(&self.account.username) {
            return Err(PosterError::MissingConfigError {
                field: format!("account.username ({})", USERNAME_ENV),
            });
        }

        validate_path("digits.path", &self.digits.path)?;
        self.separator_byte()?;
        validate_path("run.data_dir", &self.run.data_dir)?;
        validate_path("run.session_file", &self.run.session_file)?;
        validate_path("run.state_file", &self.run.state_file)?;
        validate_range("run.target_index", self.run.target_index, -1, i64::MAX - 1)?;
        if let Some(max_posts) = self.run.max_posts {
            validate_range("run.max_posts", max_posts, 1, usize::MAX)?;
        }

        self.client.validate()?;

        validate_range("render.size", self.render.size, 64, 4096)?;
        validate_range("render.jpeg_quality", self.render.jpeg_quality, 1, 100)?;
        validate_path("render.output_dir", &self.render.output_dir)?;

        Ok(())
    }
}

fn is_unresolved(value: &str) -> bool {
    value.trim_start().starts_with("${")
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let toml_content = r#"
[account]
username = "@pi_digits"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.username(), "pi_digits");
        assert_eq!(config.digits.path, "pi.txt");
        assert_eq!(config.run.target_index, 229);
        assert_eq!(config.render.style, RenderStyle::Starfield);
        assert_eq!(config.client.app_id, "936619743392459");
        assert!(config.validate().is_ok());
        assert!(config.credentials().is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r##"
[account]
username = "pi_digits"
encrypted_password = "#PWD_INSTAGRAM_BROWSER:10:1749219645:AelQ"

[digits]
path = "data/pi.txt"

[run]
target_index = 10
max_posts = 3
post_delay_seconds = 5

[client]
base_url = "https://staging.example.com"
user_agent = "TestAgent/1.0"
cookies = { ig_nrcb = "1" }

[render]
style = "gradient"
size = 512
seed = 7

[monitoring]
json_logs = true
"##;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.run.max_posts, Some(3));
        assert_eq!(config.post_delay(), Duration::from_secs(5));
        assert_eq!(config.client.user_agent, "TestAgent/1.0");
        assert_eq!(config.client.upload_url, "https://i.instagram.com");
        assert_eq!(config.client.cookies.get("ig_nrcb").map(String::as_str), Some("1"));
        assert_eq!(config.render.style, RenderStyle::Gradient);
        assert_eq!(config.render.seed, Some(7));
        assert!(config.json_logs());
        assert_eq!(config.credentials().unwrap().username, "pi_digits");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PI_POSTER_TEST_PASSWORD", "#PWD_INSTAGRAM_BROWSER:10:1:xyz");

        let toml_content = r#"
[account]
username = "pi_digits"
encrypted_password = "${PI_POSTER_TEST_PASSWORD}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.credentials().unwrap().encrypted_password,
            "#PWD_INSTAGRAM_BROWSER:10:1:xyz"
        );

        std::env::remove_var("PI_POSTER_TEST_PASSWORD");
    }

    #[test]
    fn test_unresolved_variable_is_missing() {
        let toml_content = r#"
[account]
username = "pi_digits"
encrypted_password = "${PI_POSTER_DEFINITELY_UNSET}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.credentials(),
            Err(PosterError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[account]
username = "pi_digits"

[client]
base_url = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let bad_quality = r#"
[account]
username = "pi_digits"

[render]
jpeg_quality = 0
"#;
        assert!(TomlConfig::from_toml_str(bad_quality).unwrap().validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[account]
username = "file_user"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.username(), "file_user");
    }
}
