//! Periodic sampling of the player clock.
//!
//! Sampling runs only while the player reports [`PlayerState::Playing`];
//! any other state suspends it until playback resumes. The synchronizer keeps
//! its membership across the pause, so resuming inside a window does not
//! re-announce claims already on screen.
//!
//! Teardown is atomic with respect to the sink: once [`PlaybackClock::teardown`]
//! returns, no further enter/exit calls are made, even if a tick was due.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{OverlaySink, PlaybackError, Player, PlayerState};
use crate::claims::ClaimSet;
use crate::config::OverlayConfig;
use crate::overlay::{OverlayEvent, OverlaySynchronizer};

struct SyncState {
    synchronizer: OverlaySynchronizer,
    live: bool,
}

struct Shared {
    state: Mutex<SyncState>,
    sink: Arc<dyn OverlaySink>,
    explanation_limit: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One tick. The lock is held while the sink is called so teardown
    /// cannot interleave with a half-delivered batch.
    fn sample(&self, player: &dyn Player) {
        let mut state = self.lock();
        if !state.live {
            return;
        }
        let Some(time) = player.current_time() else {
            return;
        };

        let events = state.synchronizer.tick(time);
        let claims = Arc::clone(state.synchronizer.claims());
        for event in events {
            match event {
                OverlayEvent::Enter { index, slot } => {
                    if let Some(claim) = claims.get(index) {
                        let text = claim.overlay_text(self.explanation_limit);
                        self.sink.enter(index, slot, claim, &text);
                    }
                }
                OverlayEvent::Exit { index, slot } => self.sink.exit(index, slot),
            }
        }
    }
}

/// Live overlay session for one player.
pub struct PlaybackClock {
    player: Arc<dyn Player>,
    shared: Arc<Shared>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PlaybackClock {
    /// Start sampling `player` for `claims`. Must be called within a tokio runtime.
    pub fn start(
        player: Arc<dyn Player>,
        claims: Arc<ClaimSet>,
        config: &OverlayConfig,
        sink: Arc<dyn OverlaySink>,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(SyncState {
                synchronizer: OverlaySynchronizer::new(claims, config.window_secs),
                live: true,
            }),
            sink,
            explanation_limit: config.explanation_limit,
        });
        let token = CancellationToken::new();

        let task = tokio::spawn(run(
            Arc::clone(&player),
            Arc::clone(&shared),
            token.clone(),
            config.sample_interval(),
        ));

        Self {
            player,
            shared,
            token,
            task: Some(task),
        }
    }

    /// Seek to a claim's timestamp and start playing.
    pub fn seek_to_claim(&self, index: usize) -> Result<(), PlaybackError> {
        let timestamp = {
            let state = self.shared.lock();
            if !state.live {
                return Err(PlaybackError::Unavailable);
            }
            state
                .synchronizer
                .claims()
                .get(index)
                .map(|claim| claim.timestamp)
                .ok_or(PlaybackError::NoSuchClaim(index))?
        };

        self.seek_to(timestamp);
        Ok(())
    }

    /// Seek, play, and resynchronize overlays immediately.
    pub fn seek_to(&self, seconds: f64) {
        debug!(seconds, "Seeking");
        self.player.seek_to(seconds);
        self.player.play();
        self.sample_now();
    }

    /// Take a sample outside the regular cadence.
    pub fn sample_now(&self) {
        self.shared.sample(self.player.as_ref());
    }

    #[must_use]
    pub fn active_indices(&self) -> Vec<usize> {
        self.shared.lock().synchronizer.active_indices()
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.shared.lock().live
    }

    /// Stop sampling, clear the active set and release the player.
    ///
    /// Idempotent.
    pub fn teardown(&mut self) {
        self.token.cancel();
        {
            let mut state = self.shared.lock();
            if !state.live {
                return;
            }
            state.live = false;
            state.synchronizer.reset();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.player.destroy();
        info!("Overlay session torn down");
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run(
    player: Arc<dyn Player>,
    shared: Arc<Shared>,
    token: CancellationToken,
    every: Duration,
) {
    let mut states = player.state_changes();

    loop {
        let state: PlayerState = *states.borrow_and_update();

        if state.is_playing() {
            debug!("Playback running, sampling every {:?}", every);
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    changed = states.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        let state: PlayerState = *states.borrow_and_update();
                        if !state.is_playing() {
                            break;
                        }
                    }
                    _ = ticker.tick() => shared.sample(player.as_ref()),
                }
            }
            debug!("Playback stopped, sampling suspended");
        } else {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                changed = states.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
