//! In-process result store.
//!
//! Used where no remote store is wanted (tests, demos, offline sessions).
//! Supports documents that only become visible after a number of reads,
//! to stand in for the worker finishing while a poll is running.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ResultStore, StoreError};
use crate::claims::ResultDocument;
use crate::video_id::VideoId;

#[derive(Debug)]
struct Entry {
    document: ResultDocument,
    /// Reads of this id still answered with "not found"
    hidden_reads: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<VideoId, Entry>,
    failures: VecDeque<StoreError>,
    reads_by_id: HashMap<VideoId, usize>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    reads: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a document visible immediately.
    pub fn insert(&self, video_id: VideoId, document: ResultDocument) {
        self.publish_after(video_id, document, 0);
    }

    /// Make a document visible from read number `hidden_reads + 1` onward.
    pub fn publish_after(&self, video_id: VideoId, document: ResultDocument, hidden_reads: usize) {
        self.lock().entries.insert(
            video_id,
            Entry {
                document,
                hidden_reads,
            },
        );
    }

    /// Fail the next read (of any id) with `error`. Failures queue up.
    pub fn push_failure(&self, error: StoreError) {
        self.lock().failures.push_back(error);
    }

    /// Total reads served, including failed ones.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reads_for(&self, video_id: &VideoId) -> usize {
        self.lock().reads_by_id.get(video_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn check_for_result(
        &self,
        video_id: &VideoId,
    ) -> Result<Option<ResultDocument>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        *inner.reads_by_id.entry(video_id.clone()).or_default() += 1;

        if let Some(error) = inner.failures.pop_front() {
            return Err(error);
        }

        match inner.entries.get_mut(video_id) {
            Some(entry) if entry.hidden_reads > 0 => {
                entry.hidden_reads -= 1;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.document.clone())),
            None => Ok(None),
        }
    }
}
