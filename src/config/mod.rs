pub mod cli;
pub mod client_profile;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Loads `.env`, then `.env.override` on top of it. Missing files are fine.
pub fn load_env_files() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    if let Ok(path) = dotenvy::from_filename_override(".env.override") {
        tracing::debug!("Loaded environment overrides from {}", path.display());
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pi-poster")]
#[command(about = "Posts the digits of pi, one image per post")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = toml_config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Override the target index from the config
    #[arg(long, allow_hyphen_values = true)]
    pub target: Option<i64>,

    /// Stop after this many posts
    #[arg(long)]
    pub max_posts: Option<usize>,

    /// Show what would be posted next without publishing
    #[arg(long)]
    pub dry_run: bool,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply(&self, config: &mut toml_config::TomlConfig) {
        if let Some(target) = self.target {
            tracing::info!("Target index overridden to: {}", target);
            config.run.target_index = target;
        }
        if let Some(max_posts) = self.max_posts {
            config.run.max_posts = Some(max_posts);
        }
    }
}
