//! Check orchestrator.
//!
//! Drives one user-visible check from a reference string to displayed
//! claims:
//!
//! ```text
//! Idle → Validating → CacheCheck ─┬─────────────────────────────→ Found → Displayed
//!                                 └→ Triggering → AwaitingUser
//!                                      (resume) → Polling ─┬─────→ Found → Displayed
//!                                                          └─────→ TimedOut (resume/recheck)
//! ```
//!
//! Work items are requested through a link the user follows
//! ([`IssueTrigger`]); the flow parks in [`CheckState::AwaitingUser`] until
//! [`Checker::resume`] is called.
//!
//! Every flow carries a generation number. Starting a new flow (or tearing
//! down) bumps it, cancels outstanding poll sessions and the overlay session
//! of the previous video, and any continuation of an older flow ends with
//! [`CheckError::Cancelled`] without touching state or the presenter.

mod presenter;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::claims::{ClaimSet, ResultDocument};
use crate::config::{Config, OverlayConfig, PollConfig};
use crate::playback::{OverlaySink, PlaybackClock, PlaybackError, PlayerFactory};
use crate::poll::{PollError, Poller};
use crate::store::{check_or_absent, ResultStore};
use crate::trigger::{IssueTrigger, TranscriptEntry, TriggerError};
use crate::video_id::{InvalidReference, VideoId};

pub use presenter::{Presenter, Status, StatusKind};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidReference),

    #[error("Failed to prepare the fact-check request: {0}")]
    TriggerFailed(#[from] TriggerError),

    /// Recoverable: resume or recheck later.
    #[error(transparent)]
    PollTimeout(PollError),

    #[error("Overlays unavailable ({0})")]
    PlaybackInitFailed(#[from] PlaybackError),

    #[error("check was superseded or torn down")]
    Cancelled,

    #[error("no check is waiting for results")]
    NothingToResume,
}

impl From<PollError> for CheckError {
    fn from(e: PollError) -> Self {
        match e {
            PollError::Timeout { .. } => Self::PollTimeout(e),
            PollError::Cancelled => Self::Cancelled,
        }
    }
}

/// Where the current check stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckState {
    #[default]
    Idle,
    Validating,
    CacheCheck { video_id: VideoId },
    Triggering { video_id: VideoId },
    /// Suspended until the user has submitted the work item and resumes
    AwaitingUser { video_id: VideoId, reference: String },
    Polling { video_id: VideoId },
    Found { video_id: VideoId },
    Displayed { video_id: VideoId, overlays: bool },
    TimedOut { video_id: VideoId },
    Failed { video_id: Option<VideoId>, message: String },
}

impl CheckState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::CacheCheck { .. } => "cache_check",
            Self::Triggering { .. } => "triggering",
            Self::AwaitingUser { .. } => "awaiting_user",
            Self::Polling { .. } => "polling",
            Self::Found { .. } => "found",
            Self::Displayed { .. } => "displayed",
            Self::TimedOut { .. } => "timed_out",
            Self::Failed { .. } => "failed",
        }
    }
}

/// How a call into the flow ended, short of an error.
#[derive(Debug)]
pub enum CheckOutcome {
    Displayed {
        video_id: VideoId,
        claims: Arc<ClaimSet>,
        /// Set when the player could not start; the claims list is still shown
        overlay_error: Option<CheckError>,
    },
    ActionRequired {
        video_id: VideoId,
        reference: String,
    },
}

#[derive(Debug, Default)]
struct Flow {
    generation: u64,
    state: CheckState,
    transcript: Option<Vec<TranscriptEntry>>,
}

/// Owns one check flow and the overlay session it produces.
pub struct Checker {
    store: Arc<dyn ResultStore>,
    poller: Poller,
    trigger: IssueTrigger,
    players: Arc<dyn PlayerFactory>,
    presenter: Arc<dyn Presenter>,
    sink: Arc<dyn OverlaySink>,
    poll_config: PollConfig,
    overlay_config: OverlayConfig,
    flow: Mutex<Flow>,
    playback: Mutex<Option<PlaybackClock>>,
}

impl Checker {
    pub fn new(
        config: &Config,
        store: Arc<dyn ResultStore>,
        players: Arc<dyn PlayerFactory>,
        presenter: Arc<dyn Presenter>,
        sink: Arc<dyn OverlaySink>,
    ) -> Result<Self, TriggerError> {
        Ok(Self {
            poller: Poller::new(Arc::clone(&store)),
            store,
            trigger: IssueTrigger::new(&config.store, &config.trigger)?,
            players,
            presenter,
            sink,
            poll_config: config.poll,
            overlay_config: config.overlay,
            flow: Mutex::new(Flow::default()),
            playback: Mutex::new(None),
        })
    }

    fn flow(&self) -> MutexGuard<'_, Flow> {
        self.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn playback(&self) -> MutexGuard<'_, Option<PlaybackClock>> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> CheckState {
        self.flow().state.clone()
    }

    /// Start a check for a user-supplied reference.
    pub async fn submit(&self, reference: &str) -> Result<CheckOutcome, CheckError> {
        self.submit_with_transcript(reference, None).await
    }

    /// Start a check, attaching a transcript to the work-item request.
    ///
    /// An unrecognized reference is rejected before any I/O and leaves the
    /// current flow untouched.
    pub async fn submit_with_transcript(
        &self,
        reference: &str,
        transcript: Option<Vec<TranscriptEntry>>,
    ) -> Result<CheckOutcome, CheckError> {
        let video_id = match VideoId::extract(reference) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Rejected reference");
                self.presenter.status(&Status::error(&e));
                self.presenter.set_input_enabled(true);
                return Err(e.into());
            }
        };

        let generation = self.begin_flow(transcript);
        self.cache_check(generation, video_id).await
    }

    /// Continue a suspended or timed-out check by polling for its result.
    pub async fn resume(&self) -> Result<CheckOutcome, CheckError> {
        let (generation, video_id) = {
            let mut flow = self.flow();
            let video_id = match &flow.state {
                CheckState::AwaitingUser { video_id, .. } | CheckState::TimedOut { video_id } => {
                    video_id.clone()
                }
                _ => return Err(CheckError::NothingToResume),
            };
            info!(video_id = %video_id, from = flow.state.name(), "Resuming check");
            flow.state = CheckState::Polling { video_id: video_id.clone() };
            (flow.generation, video_id)
        };

        self.presenter.set_input_enabled(false);
        self.presenter
            .status(&Status::info("Fact-checking in progress... This may take 1-2 minutes"));

        match self.poller.poll(&video_id, self.poll_config).await {
            Ok(document) => self.display(generation, video_id, document).await,
            Err(e @ PollError::Timeout { .. }) => {
                self.transition(
                    generation,
                    CheckState::TimedOut { video_id },
                    Some(Status::error(&e)),
                )?;
                self.presenter.set_input_enabled(true);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look the document up again for a suspended or timed-out check.
    pub async fn recheck(&self) -> Result<CheckOutcome, CheckError> {
        let video_id = match self.state() {
            CheckState::AwaitingUser { video_id, .. } | CheckState::TimedOut { video_id } => {
                video_id
            }
            _ => return Err(CheckError::NothingToResume),
        };

        let transcript = self.flow().transcript.take();
        let generation = self.begin_flow(transcript);
        self.cache_check(generation, video_id).await
    }

    /// Seek the player to a claim, as when a claims-list row is selected.
    pub fn seek_to_claim(&self, index: usize) -> Result<(), CheckError> {
        match self.playback().as_ref() {
            Some(clock) => Ok(clock.seek_to_claim(index)?),
            None => Err(PlaybackError::Unavailable.into()),
        }
    }

    /// Abandon whatever is running and release the player.
    pub fn teardown(&self) {
        {
            let mut flow = self.flow();
            flow.generation += 1;
            flow.state = CheckState::Idle;
            flow.transcript = None;
        }
        self.poller.cancel_all();
        self.teardown_overlay();
        self.presenter.set_input_enabled(true);
    }

    fn begin_flow(&self, transcript: Option<Vec<TranscriptEntry>>) -> u64 {
        let generation = {
            let mut flow = self.flow();
            flow.generation += 1;
            flow.state = CheckState::Validating;
            flow.transcript = transcript;
            flow.generation
        };
        self.poller.cancel_all();
        self.teardown_overlay();
        self.presenter.set_input_enabled(false);
        generation
    }

    fn teardown_overlay(&self) {
        let previous = self.playback().take();
        drop(previous);
    }

    async fn cache_check(&self, generation: u64, video_id: VideoId) -> Result<CheckOutcome, CheckError> {
        self.transition(
            generation,
            CheckState::CacheCheck { video_id: video_id.clone() },
            Some(Status::info("Checking for cached results...")),
        )?;

        match check_or_absent(self.store.as_ref(), &video_id).await {
            Some(document) => self.display(generation, video_id, document).await,
            None => self.request_work(generation, video_id),
        }
    }

    fn request_work(&self, generation: u64, video_id: VideoId) -> Result<CheckOutcome, CheckError> {
        self.transition(
            generation,
            CheckState::Triggering { video_id: video_id.clone() },
            Some(Status::info("No cached results found. Preparing a fact-check request...")),
        )?;

        let transcript = self.flow().transcript.clone();
        let reference = match self.trigger.actionable_reference(&video_id, transcript.as_deref()) {
            Ok(reference) => reference,
            Err(e) => return Err(self.fail(generation, Some(video_id), e.into())),
        };

        self.transition(
            generation,
            CheckState::AwaitingUser {
                video_id: video_id.clone(),
                reference: reference.clone(),
            },
            Some(Status::action(format!(
                "Submit the fact-check request at {reference}, then resume to wait for results."
            ))),
        )?;
        self.presenter.set_input_enabled(true);

        Ok(CheckOutcome::ActionRequired { video_id, reference })
    }

    async fn display(
        &self,
        generation: u64,
        video_id: VideoId,
        document: ResultDocument,
    ) -> Result<CheckOutcome, CheckError> {
        let claims = Arc::new(document.claims);
        self.transition(
            generation,
            CheckState::Found { video_id: video_id.clone() },
            Some(Status::success("Fact-check complete!")),
        )?;
        self.presenter.show_claims(&video_id, &claims.list_entries());
        self.teardown_overlay();

        let overlay_error = match self.players.create(&video_id).await {
            Ok(player) => {
                let flow = self.flow();
                if flow.generation != generation {
                    player.destroy();
                    return Err(CheckError::Cancelled);
                }
                let clock = PlaybackClock::start(
                    player,
                    Arc::clone(&claims),
                    &self.overlay_config,
                    Arc::clone(&self.sink),
                );
                let previous = self.playback().replace(clock);
                drop(flow);
                drop(previous);
                None
            }
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Player failed to start, overlays disabled");
                Some(CheckError::PlaybackInitFailed(e))
            }
        };

        let status = overlay_error
            .as_ref()
            .map(|e| Status::error(format!("{e}. The claims list is still available.")));
        self.transition(
            generation,
            CheckState::Displayed {
                video_id: video_id.clone(),
                overlays: overlay_error.is_none(),
            },
            status,
        )?;
        self.presenter.set_input_enabled(true);

        Ok(CheckOutcome::Displayed {
            video_id,
            claims,
            overlay_error,
        })
    }

    /// Move to `state` if `generation` is still current, updating the status region.
    fn transition(
        &self,
        generation: u64,
        state: CheckState,
        status: Option<Status>,
    ) -> Result<(), CheckError> {
        let mut flow = self.flow();
        if flow.generation != generation {
            return Err(CheckError::Cancelled);
        }
        info!(from = flow.state.name(), to = state.name(), "Check state change");
        flow.state = state;
        if let Some(status) = status {
            self.presenter.status(&status);
        }
        Ok(())
    }

    fn fail(&self, generation: u64, video_id: Option<VideoId>, err: CheckError) -> CheckError {
        let message = err.to_string();
        let failed = CheckState::Failed {
            video_id,
            message: message.clone(),
        };
        if self
            .transition(generation, failed, Some(Status::error(&message)))
            .is_ok()
        {
            error!(error = %message, "Check failed");
            self.presenter.set_input_enabled(true);
        }
        err
    }
}
