pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use adapters::{instagram::InstagramClient, render::CosmicRenderer};
pub use core::{
    digit_locator::DigitLocator,
    poster::{PiPoster, RunSettings},
    session_store::SessionStore,
    state_store::StateStore,
};
pub use domain::model::{DigitResult, RunState, RunSummary, SessionInfo, StopReason};
pub use utils::error::{PosterError, Result};
