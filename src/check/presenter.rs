//! User-facing surface driven by the check flow.

use std::fmt;

use crate::claims::ClaimListEntry;
use crate::video_id::VideoId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
    /// The user has to do something before the flow can continue
    Action,
}

/// Content of the status/progress region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: StatusKind::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: StatusKind::Success, message: message.into() }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self { kind: StatusKind::Error, message: format!("Error: {message}") }
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self { kind: StatusKind::Action, message: message.into() }
    }
}

/// Receives everything the check flow wants shown.
///
/// Calls are made with internal state locked; implementations must not call
/// back into the [`Checker`](super::Checker).
pub trait Presenter: Send + Sync {
    fn status(&self, status: &Status);

    /// Enable or disable the reference input and submit control.
    fn set_input_enabled(&self, enabled: bool);

    fn show_claims(&self, video_id: &VideoId, entries: &[ClaimListEntry]);
}
