//! Video identifier extraction from user-supplied references.
//!
//! Accepts the common `YouTube` reference shapes:
//!
//! - `https://www.youtube.com/watch?v=<id>`
//! - `https://youtu.be/<id>`
//! - `https://www.youtube.com/embed/<id>`
//!
//! The extracted identifier doubles as a path segment in the result store
//! address, so only `[A-Za-z0-9_-]` characters are accepted.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Patterns tried in order; first capture wins.
static PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"youtube\.com/watch\?v=([^&#]+)").expect("valid watch pattern"),
        Regex::new(r"youtu\.be/([^?&#/]+)").expect("valid short pattern"),
        Regex::new(r"youtube\.com/embed/([^?&#/]+)").expect("valid embed pattern"),
    ]
});

/// Reasons a reference string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReference {
    #[error("Please enter a YouTube URL")]
    Empty,

    #[error("Invalid YouTube URL")]
    Unrecognized,
}

/// Opaque identifier of a video, immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the identifier from a user-supplied reference.
    pub fn extract(reference: &str) -> Result<Self, InvalidReference> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(InvalidReference::Empty);
        }

        PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(reference))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|id| is_valid_id(id))
            .map(|id| Self(id.to_string()))
            .ok_or(InvalidReference::Unrecognized)
    }

    /// Build from an already-known identifier (e.g. read back from a document).
    pub fn parse(id: &str) -> Result<Self, InvalidReference> {
        if is_valid_id(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(InvalidReference::Unrecognized)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
