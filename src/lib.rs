//! `factcue` - time-synchronized fact-check overlays for video playback
//!
//! # Features
//!
//! - **Result retrieval**: cache check, user-mediated work-item request and
//!   bounded fixed-interval polling against an eventually-consistent store
//! - **Overlay synchronization**: windowed enter/exit events for timed claims,
//!   robust to pauses, seeks and overlapping windows
//! - **Cancellation**: poll sessions and sampling tasks stop as soon as a new
//!   check starts or the session is torn down
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use factcue::{Config, RawContentStore, StoreHttpClient, ResultStore, VideoId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let http = StoreHttpClient::new(&config.http)?;
//!     let store: Arc<dyn ResultStore> = Arc::new(RawContentStore::new(http, &config.store)?);
//!
//!     let id = VideoId::extract("https://youtu.be/dQw4w9WgXcQ")?;
//!     match store.check_for_result(&id).await? {
//!         Some(doc) => println!("{} claims", doc.claims.len()),
//!         None => println!("not checked yet"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod claims;
pub mod config;
pub mod http_client;
pub mod overlay;
pub mod playback;
pub mod poll;
pub mod store;
pub mod trigger;
pub mod video_id;

pub use check::{CheckError, CheckOutcome, CheckState, Checker, Presenter, Status, StatusKind};
pub use claims::{format_timestamp, Claim, ClaimListEntry, ClaimSet, ResultDocument, Verdict};
pub use config::{Config, OverlayConfig, PollConfig};
pub use http_client::StoreHttpClient;
pub use overlay::{OverlayAnchor, OverlayEvent, OverlaySlot, OverlaySynchronizer};
pub use playback::{OverlaySink, PlaybackClock, PlaybackError, Player, PlayerFactory, PlayerState};
pub use poll::{PollError, Poller};
pub use store::{MemoryStore, RawContentStore, ResultStore, StoreError};
pub use trigger::{IssueTrigger, TranscriptEntry, TriggerError};
pub use video_id::{InvalidReference, VideoId};

/// Version of factcue
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
