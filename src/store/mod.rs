//! Result store client.
//!
//! The store is a key-value lookup from [`VideoId`] to [`ResultDocument`],
//! written out-of-band by the fact-check worker. A missing document is an
//! expected answer (`Ok(None)`), distinct from a [`StoreError`].
//!
//! # Architecture
//!
//! - [`ResultStore`]: async trait for a single lookup
//! - [`RawContentStore`]: reads `<results_dir>/<id>.json` from a raw-content host
//! - [`MemoryStore`]: in-process store with scripted visibility and failures

mod memory;
mod raw;

use async_trait::async_trait;
use thiserror::Error;

use crate::claims::{DocumentError, ResultDocument};
use crate::video_id::VideoId;

pub use memory::MemoryStore;
pub use raw::RawContentStore;

/// Failures reading the store. Never fatal on a single attempt.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("store returned HTTP {0}")]
    Status(u16),

    #[error("unusable document: {0}")]
    Parse(#[from] DocumentError),
}

/// Lookup of claims documents by video identifier.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Short name for logs (e.g. `"raw"`, `"memory"`).
    fn name(&self) -> &'static str;

    /// Fetch the document for `video_id`.
    ///
    /// Returns `Ok(None)` when the store reports the document as missing.
    async fn check_for_result(
        &self,
        video_id: &VideoId,
    ) -> Result<Option<ResultDocument>, StoreError>;
}

/// Single lookup with store failures absorbed as "not found".
///
/// The failure is logged at `warn` so it stays distinguishable from a
/// genuine miss.
pub async fn check_or_absent(store: &dyn ResultStore, video_id: &VideoId) -> Option<ResultDocument> {
    match store.check_for_result(video_id).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(
                store = store.name(),
                video_id = %video_id,
                error = %e,
                "Store lookup failed, treating as not found"
            );
            None
        }
    }
}
