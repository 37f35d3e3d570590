//! The posting loop: read the account's post count, look up the digit at
//! `count - 1`, render it and publish it, until the target index is reached.

use crate::adapters::render::encode_jpeg;
use crate::core::caption::caption_for;
use crate::core::session_store::SessionStore;
use crate::core::state_store::StateStore;
use crate::domain::model::{
    Credentials, DigitResult, PlannedPost, PublishedPost, RunState, RunSummary, SessionInfo,
    StopReason, UploadImage,
};
use crate::domain::ports::{DigitRenderer, DigitSource, Glyph, SocialClient, Storage};
use crate::utils::error::{PosterError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub username: String,
    /// Used only when no usable session is stored.
    pub credentials: Option<Credentials>,
    pub target_index: i64,
    pub max_posts: Option<usize>,
    pub post_delay: Duration,
    pub jpeg_quality: u8,
}

/// Where the account currently stands relative to the target.
enum NextStep {
    Post(i64, DigitResult),
    Stop(StopReason),
}

pub struct PiPoster<C, D, R, S>
where
    C: SocialClient,
    D: DigitSource,
    R: DigitRenderer,
    S: Storage,
{
    client: C,
    digits: D,
    renderer: R,
    sessions: SessionStore<S>,
    states: StateStore<S>,
    settings: RunSettings,
}

impl<C, D, R, S> PiPoster<C, D, R, S>
where
    C: SocialClient,
    D: DigitSource,
    R: DigitRenderer,
    S: Storage,
{
    pub fn new(
        client: C,
        digits: D,
        renderer: R,
        sessions: SessionStore<S>,
        states: StateStore<S>,
        settings: RunSettings,
    ) -> Self {
        Self {
            client,
            digits,
            renderer,
            sessions,
            states,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let mut state = self.states.load_or_new(self.settings.target_index).await?;
        tracing::info!(
            "Starting run for @{} (last index {}, target {})",
            self.settings.username,
            state.last_index,
            state.target_index
        );

        let mut posts: Vec<PublishedPost> = Vec::new();
        if state.is_complete() {
            tracing::info!("Target index {} already reached", state.target_index);
            return Ok(RunSummary {
                posts,
                state,
                stop: StopReason::TargetReached,
            });
        }

        let session = self.ensure_session().await?;

        let stop = loop {
            if state.is_complete() {
                break StopReason::TargetReached;
            }
            if let Some(limit) = self.settings.max_posts {
                if posts.len() >= limit {
                    tracing::info!("Post limit of {} reached", limit);
                    break StopReason::PostLimit;
                }
            }

            let (index, digit) = match self.next_step(&session, &state).await? {
                NextStep::Post(index, digit) => (index, digit),
                NextStep::Stop(reason) => break reason,
            };

            if let Some(previous) = posts.last() {
                if index <= previous.index {
                    return Err(PosterError::StaleCount {
                        last_index: previous.index,
                        observed: index,
                    });
                }
            }

            let caption = caption_for(index, digit);
            let image = self.render(digit)?;
            tracing::info!("Publishing index {} ({}): {}", index, digit, caption);
            let receipt = self.client.publish(&session, &image, &caption).await?;

            state.last_index = index;
            self.states.save(&state).await?;
            posts.push(PublishedPost { index, receipt });

            if !state.is_complete() && !self.settings.post_delay.is_zero() {
                tracing::debug!("Waiting {:?} before the next post", self.settings.post_delay);
                tokio::time::sleep(self.settings.post_delay).await;
            }
        };

        tracing::info!(
            "Run finished after {} post(s): {:?} (last index {})",
            posts.len(),
            stop,
            state.last_index
        );
        Ok(RunSummary { posts, state, stop })
    }

    /// Works out the next post, renders it, and stops short of publishing.
    pub async fn dry_run(&self) -> Result<Option<PlannedPost>> {
        let state = self.states.load_or_new(self.settings.target_index).await?;
        if state.is_complete() {
            tracing::info!(
                "Dry run: nothing to publish, target index {} already reached",
                state.target_index
            );
            return Ok(None);
        }
        let session = self.ensure_session().await?;

        match self.next_step(&session, &state).await? {
            NextStep::Post(index, digit) => {
                let image = self.render(digit)?;
                let plan = PlannedPost {
                    index,
                    digit,
                    caption: caption_for(index, digit),
                };
                tracing::info!(
                    "Dry run: would publish index {} ({} bytes) with caption '{}'",
                    plan.index,
                    image.bytes.len(),
                    plan.caption
                );
                Ok(Some(plan))
            }
            NextStep::Stop(reason) => {
                tracing::info!("Dry run: nothing to publish ({:?})", reason);
                Ok(None)
            }
        }
    }

    /// Stored session if usable, otherwise a fresh login that is saved for next time.
    pub async fn ensure_session(&self) -> Result<SessionInfo> {
        if let Some(session) = self.sessions.load().await? {
            if session.is_usable() {
                return Ok(session);
            }
            tracing::warn!("Stored session is not usable, logging in again");
        }

        let credentials =
            self.settings
                .credentials
                .as_ref()
                .ok_or_else(|| PosterError::SessionError {
                    message: format!(
                        "no usable session in {} and no credentials configured",
                        self.sessions.file_name()
                    ),
                })?;

        let session = self.client.login(credentials).await?;
        self.sessions.save(&session).await?;
        Ok(session)
    }

    async fn next_step(&self, session: &SessionInfo, state: &RunState) -> Result<NextStep> {
        let count = self
            .client
            .media_count(session, &self.settings.username)
            .await?;
        let index = i64::try_from(count)
            .map(|count| count - 1)
            .map_err(|_| PosterError::processing(format!("media count {} out of range", count)))?;
        tracing::info!("@{} has {} posts, next index is {}", self.settings.username, count, index);

        if index > state.target_index {
            tracing::info!("Index {} is past target {}", index, state.target_index);
            return Ok(NextStep::Stop(StopReason::TargetReached));
        }

        let digit = self.digits.digit_at(index)?;
        if digit.is_absent() {
            tracing::warn!("No digit at index {}, the sequence is exhausted", index);
            return Ok(NextStep::Stop(StopReason::SequenceExhausted));
        }
        Ok(NextStep::Post(index, digit))
    }

    fn render(&self, digit: DigitResult) -> Result<UploadImage> {
        let glyph = Glyph::from_result(digit).ok_or_else(|| PosterError::RenderError {
            message: format!("'{}' cannot be drawn", digit),
        })?;
        let image = self.renderer.render(glyph)?;
        encode_jpeg(&image, self.settings.jpeg_quality)
    }
}
