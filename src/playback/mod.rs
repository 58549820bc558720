//! Playback clock adapter.
//!
//! The embedded video widget is consumed through the [`Player`] capability
//! trait: query the current time, seek, play, and watch state changes.
//! [`PlaybackClock`] samples that time while the video plays and feeds an
//! [`OverlaySynchronizer`](crate::overlay::OverlaySynchronizer), forwarding
//! its events to an [`OverlaySink`].

mod clock;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::claims::Claim;
use crate::overlay::OverlaySlot;
use crate::video_id::VideoId;

pub use clock::PlaybackClock;

/// Player state as reported by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Ended,
    Cued,
}

impl PlayerState {
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("video player failed to load: {0}")]
    Init(String),

    #[error("video player is not available")]
    Unavailable,

    #[error("no claim at index {0}")]
    NoSuchClaim(usize),
}

/// Capabilities of an embedded video player.
pub trait Player: Send + Sync {
    /// Current playback position in seconds, `None` until the player is ready.
    fn current_time(&self) -> Option<f64>;

    fn seek_to(&self, seconds: f64);

    fn play(&self);

    /// Stream of state changes; the current value is the latest state.
    fn state_changes(&self) -> watch::Receiver<PlayerState>;

    /// Release the widget. Called once on teardown.
    fn destroy(&self) {}
}

/// Creates a player for a video, resolving once the widget is ready.
#[async_trait]
pub trait PlayerFactory: Send + Sync {
    async fn create(&self, video_id: &VideoId) -> Result<Arc<dyn Player>, PlaybackError>;
}

/// Presentation side of the overlays.
///
/// Calls arrive from the sampling task; implementations must not call back
/// into the [`PlaybackClock`] that owns them.
pub trait OverlaySink: Send + Sync {
    /// `text` is the rendered bubble: verdict plus truncated explanation.
    fn enter(&self, index: usize, slot: OverlaySlot, claim: &Claim, text: &str);

    fn exit(&self, index: usize, slot: OverlaySlot);
}
