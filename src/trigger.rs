//! User-mediated work-item submission.
//!
//! Instead of calling an authenticated API, the check flow hands the user a
//! link that opens a pre-filled "new issue" form on the worker's repository:
//!
//! - title: `Fact-check: <video_id>`
//! - body: a sentence with the watch URL, optionally followed by a fenced
//!   `json` block with the transcript the worker should check
//!
//! Building the link performs no I/O. Submitting the same video twice only
//! creates a duplicate work item, which the worker tolerates.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::{StoreConfig, TriggerConfig};
use crate::video_id::VideoId;

/// One transcript line as the worker expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Start offset in seconds
    pub start: f64,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("work-item link is {len} bytes, over the {max} byte limit; shorten the transcript")]
    ReferenceTooLong { len: usize, max: usize },

    #[error("could not encode transcript: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid repository URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Builds actionable work-item links for a fixed repository.
#[derive(Debug, Clone)]
pub struct IssueTrigger {
    new_issue_url: Url,
    max_url_len: usize,
}

impl IssueTrigger {
    pub fn new(store: &StoreConfig, trigger: &TriggerConfig) -> Result<Self, TriggerError> {
        let base = trigger.web_base_url.trim_end_matches('/');
        let new_issue_url = Url::parse(&format!(
            "{base}/{}/{}/issues/new",
            store.owner, store.repo
        ))?;

        Ok(Self {
            new_issue_url,
            max_url_len: trigger.max_url_len,
        })
    }

    /// Link the user follows to request a fact-check of `video_id`.
    pub fn actionable_reference(
        &self,
        video_id: &VideoId,
        transcript: Option<&[TranscriptEntry]>,
    ) -> Result<String, TriggerError> {
        let title = issue_title(video_id);
        let body = issue_body(video_id, transcript)?;

        let reference = format!(
            "{}?title={}&body={}",
            self.new_issue_url,
            urlencoding::encode(&title),
            urlencoding::encode(&body)
        );

        if reference.len() > self.max_url_len {
            return Err(TriggerError::ReferenceTooLong {
                len: reference.len(),
                max: self.max_url_len,
            });
        }

        tracing::debug!(video_id = %video_id, len = reference.len(), "Built work-item link");
        Ok(reference)
    }
}

fn issue_title(video_id: &VideoId) -> String {
    format!("Fact-check: {video_id}")
}

fn issue_body(
    video_id: &VideoId,
    transcript: Option<&[TranscriptEntry]>,
) -> Result<String, serde_json::Error> {
    let mut body = format!("Please fact-check this video: {}", video_id.watch_url());
    if let Some(entries) = transcript {
        let json = serde_json::to_string(entries)?;
        body.push_str("\n\n```json\n");
        body.push_str(&json);
        body.push_str("\n```");
    }
    Ok(body)
}
