pub mod caption;
pub mod digit_locator;
pub mod poster;
pub mod session_store;
pub mod state_store;

pub use crate::domain::model::{DigitResult, RunState, SessionInfo};
pub use crate::domain::ports::{DigitRenderer, DigitSource, SocialClient, Storage};
pub use crate::utils::error::Result;
