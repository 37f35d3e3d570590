use crate::domain::model::{
    Credentials, DigitResult, PostReceipt, SessionInfo, UploadImage,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use image::RgbImage;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Digit-at-index source. Lookups are synchronous and side-effect free.
pub trait DigitSource: Send + Sync {
    fn digit_at(&self, index: i64) -> Result<DigitResult>;
}

/// Something that can be drawn on a post: a single digit or the decimal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Digit(u8),
    Dot,
}

impl Glyph {
    /// `None` for absent results and for characters that are not decimal digits.
    pub fn from_result(result: DigitResult) -> Option<Self> {
        match result {
            DigitResult::Separator => Some(Glyph::Dot),
            other => other.value().map(Glyph::Digit),
        }
    }
}

pub trait DigitRenderer: Send + Sync {
    fn render(&self, glyph: Glyph) -> Result<RgbImage>;
}

#[async_trait]
pub trait SocialClient: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<SessionInfo>;
    async fn media_count(&self, session: &SessionInfo, username: &str) -> Result<u64>;
    async fn publish(
        &self,
        session: &SessionInfo,
        image: &UploadImage,
        caption: &str,
    ) -> Result<PostReceipt>;
}
