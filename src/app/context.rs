use crate::adapters::instagram::InstagramClient;
use crate::adapters::render::CosmicRenderer;
use crate::config::cli::LocalStorage;
use crate::config::toml_config::TomlConfig;
use crate::core::digit_locator::DigitLocator;
use crate::core::poster::{PiPoster, RunSettings};
use crate::core::session_store::SessionStore;
use crate::core::state_store::StateStore;
use crate::utils::error::{PosterError, Result};
use crate::utils::logger;
use crate::utils::validation::Validate;

pub type AppPoster = PiPoster<InstagramClient, DigitLocator, CosmicRenderer, LocalStorage>;

/// Validated configuration plus constructors for every component the binaries need.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: TomlConfig,
}

impl AppContext {
    /// Loads `.env` files, then the TOML file (or the environment when the file is absent).
    pub fn load(config_path: &str) -> Result<Self> {
        crate::config::load_env_files();
        let config = TomlConfig::load_or_env(config_path)?;
        Ok(Self { config })
    }

    pub fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    pub fn storage(&self) -> LocalStorage {
        LocalStorage::new(self.config.run.data_dir.clone())
    }

    pub fn session_store(&self) -> SessionStore<LocalStorage> {
        SessionStore::new(self.storage(), self.config.run.session_file.clone())
    }

    pub fn state_store(&self) -> StateStore<LocalStorage> {
        StateStore::new(self.storage(), self.config.run.state_file.clone())
    }

    pub fn client(&self) -> Result<InstagramClient> {
        InstagramClient::new(self.config.client.clone())
    }

    pub fn locator(&self) -> Result<DigitLocator> {
        Ok(DigitLocator::new(&self.config.digits.path).with_separator(self.config.separator_byte()?))
    }

    pub fn renderer(&self) -> CosmicRenderer {
        CosmicRenderer::from_config(&self.config.render)
    }

    pub fn run_settings(&self) -> RunSettings {
        let credentials = match self.config.credentials() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::debug!("No login credentials available: {}", e);
                None
            }
        };

        RunSettings {
            username: self.config.username(),
            credentials,
            target_index: self.config.run.target_index,
            max_posts: self.config.run.max_posts,
            post_delay: self.config.post_delay(),
            jpeg_quality: self.config.render.jpeg_quality,
        }
    }

    pub fn poster(&self) -> Result<AppPoster> {
        Ok(PiPoster::new(
            self.client()?,
            self.locator()?,
            self.renderer(),
            self.session_store(),
            self.state_store(),
            self.run_settings(),
        ))
    }
}

/// Starts logging. `config` supplies `[monitoring]` defaults when it was loaded.
pub fn init_logging(verbose: bool, json: bool, config: Option<&TomlConfig>) {
    let level = config
        .and_then(|c| c.monitoring.as_ref())
        .and_then(|m| m.log_level.as_deref());
    if json || config.is_some_and(TomlConfig::json_logs) {
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(verbose, level);
    }
}

/// Logs the failure with its category and severity, prints a user-facing message, and
/// returns the exit code for it.
pub fn report_failure(context: &str, e: &PosterError) -> i32 {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    e.severity().exit_code()
}
