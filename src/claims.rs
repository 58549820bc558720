//! Claims and the result document produced by the fact-check worker.
//!
//! Stored shape:
//!
//! ```json
//! {
//!   "video_id": "dQw4w9WgXcQ",
//!   "processed_at": null,
//!   "claims": [
//!     { "timestamp": 12.5, "verdict": "misleading", "claim": "...", "explanation": "..." }
//!   ]
//! }
//! ```
//!
//! A document without a `claims` array is garbled, not empty.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict assigned to a claim by the worker.
///
/// Unknown verdict strings are preserved verbatim in [`Verdict::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    True,
    False,
    Accurate,
    Inaccurate,
    Misleading,
    Unverifiable,
    Unverified,
    Info,
    Error,
    Other(String),
}

impl Verdict {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Accurate => "accurate",
            Self::Inaccurate => "inaccurate",
            Self::Misleading => "misleading",
            Self::Unverifiable => "unverifiable",
            Self::Unverified => "unverified",
            Self::Info => "info",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "true" => Self::True,
            "false" => Self::False,
            "accurate" => Self::Accurate,
            "inaccurate" => Self::Inaccurate,
            "misleading" => Self::Misleading,
            "unverifiable" => Self::Unverifiable,
            "unverified" => Self::Unverified,
            "info" => Self::Info,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        v.as_str().to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single fact-checked assertion tied to a playback timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Playback position in seconds
    pub timestamp: f64,
    pub verdict: Verdict,
    /// The assertion as spoken in the video
    #[serde(rename = "claim")]
    pub claim_text: String,
    pub explanation: String,
}

impl Claim {
    #[must_use]
    pub fn new(
        timestamp: f64,
        verdict: Verdict,
        claim_text: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            verdict,
            claim_text: claim_text.into(),
            explanation: explanation.into(),
        }
    }

    /// Overlay bubble text: upper-cased verdict plus the explanation
    /// truncated to `limit` characters.
    #[must_use]
    pub fn overlay_text(&self, limit: usize) -> String {
        let verdict = self.verdict.as_str().to_uppercase();
        if self.explanation.chars().count() > limit {
            let cut: String = self.explanation.chars().take(limit).collect();
            format!("{verdict}\n{cut}...")
        } else {
            format!("{verdict}\n{}", self.explanation)
        }
    }

    fn has_valid_timestamp(&self) -> bool {
        self.timestamp.is_finite() && self.timestamp >= 0.0
    }
}

/// Claims for one video, in arrival order. Index is the claim's identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    #[must_use]
    pub fn new(claims: Vec<Claim>) -> Self {
        Self(claims)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Claim> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.0.iter()
    }

    /// Materialize the claims list shown beside the player.
    #[must_use]
    pub fn list_entries(&self) -> Vec<ClaimListEntry> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, claim)| ClaimListEntry {
                index,
                heading: format!("{} @ {}", claim.verdict, format_timestamp(claim.timestamp)),
                claim_text: claim.claim_text.clone(),
                explanation: claim.explanation.clone(),
                timestamp: claim.timestamp,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type Item = &'a Claim;
    type IntoIter = std::slice::Iter<'a, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One row of the claims list.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimListEntry {
    pub index: usize,
    /// `"<verdict> @ m:ss"`
    pub heading: String,
    pub claim_text: String,
    pub explanation: String,
    /// Seek target when the row is selected
    pub timestamp: f64,
}

/// The stored artifact: written once by the worker, read many times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub claims: ClaimSet,
}

impl ResultDocument {
    #[must_use]
    pub fn new(claims: ClaimSet) -> Self {
        Self {
            video_id: None,
            processed_at: None,
            claims,
        }
    }

    /// Parse a stored document, rejecting garbled content.
    pub fn from_json(body: &str) -> Result<Self, DocumentError> {
        let doc: Self = serde_json::from_str(body)?;
        if let Some(index) = doc.claims.iter().position(|c| !c.has_valid_timestamp()) {
            return Err(DocumentError::InvalidTimestamp { index });
        }
        Ok(doc)
    }
}

/// Why a stored document could not be used.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("claim {index} has a negative or non-finite timestamp")]
    InvalidTimestamp { index: usize },
}

/// Format seconds as `m:ss` (minutes are not wrapped into hours).
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
