//! Polling coordinator.
//!
//! Repeatedly asks the [`ResultStore`] for a document at a fixed interval
//! until it appears, the attempt budget runs out, or the session is
//! cancelled.
//!
//! - Attempts are strictly sequential: attempt N starts only after attempt
//!   N-1 answered and the interval elapsed.
//! - No sleep after the final attempt, and none after a success.
//! - Store failures count as "not found" for that attempt.
//! - At most one session per [`VideoId`]: starting a second one cancels the
//!   first.
//! - Dropping a poll future ends its session; nothing keeps running.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::claims::ResultDocument;
use crate::config::PollConfig;
use crate::store::{check_or_absent, ResultStore};
use crate::video_id::VideoId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error(
        "Timed out waiting for results after {attempts} attempts (checked every {}). \
         The fact-check worker runs periodically, so please wait and try again.",
        cadence(*interval)
    )]
    Timeout { attempts: u32, interval: Duration },

    #[error("polling was cancelled")]
    Cancelled,
}

fn cadence(interval: Duration) -> String {
    let ms = interval.as_millis();
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{ms}ms")
    }
}

/// Transient state of one bounded wait for a document.
#[derive(Debug)]
struct PollSession {
    id: Uuid,
    video_id: VideoId,
    attempts_remaining: u32,
    interval: Duration,
    token: CancellationToken,
}

#[derive(Debug)]
struct Registration {
    session: Uuid,
    token: CancellationToken,
}

/// Runs poll sessions against one store.
pub struct Poller {
    store: Arc<dyn ResultStore>,
    sessions: Mutex<HashMap<VideoId, Registration>>,
}

impl Poller {
    #[must_use]
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<VideoId, Registration>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the document for `video_id`.
    ///
    /// Performs at most `config.max_attempts` checks spaced `config.interval_ms`
    /// apart. Cancels any session already running for the same id.
    #[instrument(skip(self, config), fields(video_id = %video_id))]
    pub async fn poll(
        &self,
        video_id: &VideoId,
        config: PollConfig,
    ) -> Result<ResultDocument, PollError> {
        let mut session = self.begin(video_id, config);
        let _guard = SessionGuard {
            poller: self,
            video_id: video_id.clone(),
            session: session.id,
        };
        self.run(&mut session, config.max_attempts).await
    }

    /// Cancel the session for `video_id`, if any. Returns whether one was running.
    pub fn cancel(&self, video_id: &VideoId) -> bool {
        match self.sessions().remove(video_id) {
            Some(reg) => {
                reg.token.cancel();
                debug!(video_id = %video_id, session = %reg.session, "Poll session cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every running session.
    pub fn cancel_all(&self) {
        for (_, reg) in self.sessions().drain() {
            reg.token.cancel();
        }
    }

    #[must_use]
    pub fn is_polling(&self, video_id: &VideoId) -> bool {
        self.sessions().contains_key(video_id)
    }

    fn begin(&self, video_id: &VideoId, config: PollConfig) -> PollSession {
        let session = PollSession {
            id: Uuid::new_v4(),
            video_id: video_id.clone(),
            attempts_remaining: config.max_attempts,
            interval: config.interval(),
            token: CancellationToken::new(),
        };

        let previous = self.sessions().insert(
            video_id.clone(),
            Registration {
                session: session.id,
                token: session.token.clone(),
            },
        );
        if let Some(prev) = previous {
            info!(session = %prev.session, "Replacing running poll session");
            prev.token.cancel();
        }

        session
    }

    async fn run(&self, session: &mut PollSession, max_attempts: u32) -> Result<ResultDocument, PollError> {
        let token = session.token.clone();

        for attempt in 1..=max_attempts {
            if token.is_cancelled() {
                return Err(PollError::Cancelled);
            }
            session.attempts_remaining = max_attempts - attempt;
            debug!(
                session = %session.id,
                attempt,
                remaining = session.attempts_remaining,
                "Polling for results"
            );

            let found = tokio::select! {
                biased;
                () = token.cancelled() => return Err(PollError::Cancelled),
                found = check_or_absent(self.store.as_ref(), &session.video_id) => found,
            };

            if let Some(document) = found {
                info!(session = %session.id, attempt, "Results found");
                return Ok(document);
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return Err(PollError::Cancelled),
                    () = tokio::time::sleep(session.interval) => {}
                }
            }
        }

        Err(PollError::Timeout {
            attempts: max_attempts,
            interval: session.interval,
        })
    }

    fn finish(&self, video_id: &VideoId, session: Uuid) {
        let mut sessions = self.sessions();
        if sessions.get(video_id).is_some_and(|reg| reg.session == session) {
            if let Some(reg) = sessions.remove(video_id) {
                reg.token.cancel();
            }
        }
    }
}

/// Unregisters a session however its poll future ends.
struct SessionGuard<'a> {
    poller: &'a Poller,
    video_id: VideoId,
    session: Uuid,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.poller.finish(&self.video_id, self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimSet;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use tokio::time::Instant;

    fn doc() -> ResultDocument {
        ResultDocument::new(ClaimSet::default())
    }

    fn id(s: &str) -> VideoId {
        VideoId::parse(s).unwrap()
    }

    /// Records when each read happened.
    #[derive(Default)]
    struct Recording {
        inner: MemoryStore,
        at: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl ResultStore for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn check_for_result(
            &self,
            video_id: &VideoId,
        ) -> Result<Option<ResultDocument>, StoreError> {
            self.at.lock().unwrap().push(Instant::now());
            self.inner.check_for_result(video_id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_immediately_on_first_success() {
        let store = Arc::new(MemoryStore::new());
        store.insert(id("abc"), doc());
        let poller = Poller::new(store.clone());

        let start = Instant::now();
        let result = poller.poll(&id("abc"), PollConfig::new(5, 5000)).await;

        assert!(result.is_ok());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_max_attempts_spaced_by_interval() {
        let store = Arc::new(Recording::default());
        let poller = Poller::new(store.clone());

        let start = Instant::now();
        let err = poller
            .poll(&id("abc"), PollConfig::new(4, 5000))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PollError::Timeout {
                attempts: 4,
                interval: Duration::from_millis(5000)
            }
        );
        // three gaps, no trailing sleep
        assert_eq!(start.elapsed(), Duration::from_millis(15_000));

        let at = store.at.lock().unwrap().clone();
        assert_eq!(at.len(), 4);
        for pair in at.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(5000));
        }
        assert!(!poller.is_polling(&id("abc")));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_when_document_appears_mid_poll() {
        let store = Arc::new(MemoryStore::new());
        store.publish_after(id("abc"), doc(), 2);
        let poller = Poller::new(store.clone());

        let start = Instant::now();
        poller.poll(&id("abc"), PollConfig::new(10, 1000)).await.unwrap();

        assert_eq!(store.reads(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn store_failures_count_as_not_found() {
        let store = Arc::new(MemoryStore::new());
        store.insert(id("abc"), doc());
        store.push_failure(StoreError::Status(500));
        let poller = Poller::new(store.clone());

        poller.poll(&id("abc"), PollConfig::new(3, 1000)).await.unwrap();
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_further_reads() {
        let store = Arc::new(MemoryStore::new());
        let poller = Arc::new(Poller::new(store.clone()));

        let task = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll(&id("abc"), PollConfig::new(100, 1000)).await })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(poller.cancel(&id("abc")));
        assert_eq!(task.await.unwrap(), Err(PollError::Cancelled));

        let reads = store.reads();
        assert_eq!(reads, 3);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.reads(), reads);
        assert!(!poller.is_polling(&id("abc")));
    }

    #[tokio::test(start_paused = true)]
    async fn second_poll_for_same_id_replaces_the_first() {
        let store = Arc::new(MemoryStore::new());
        let poller = Arc::new(Poller::new(store.clone()));

        let first = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll(&id("abc"), PollConfig::new(100, 1000)).await })
        };
        tokio::time::sleep(Duration::from_millis(1500)).await;

        store.publish_after(id("abc"), doc(), 1);
        let second = poller.poll(&id("abc"), PollConfig::new(100, 1000)).await;

        assert!(second.is_ok());
        assert_eq!(first.await.unwrap(), Err(PollError::Cancelled));
        assert!(!poller.is_polling(&id("abc")));
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_for_different_ids_are_independent() {
        let store = Arc::new(MemoryStore::new());
        store.publish_after(id("a"), doc(), 1);
        store.publish_after(id("b"), doc(), 3);
        let poller = Arc::new(Poller::new(store.clone()));

        let id_a = id("a");
        let id_b = id("b");
        let (a, b) = tokio::join!(
            poller.poll(&id_a, PollConfig::new(10, 1000)),
            poller.poll(&id_b, PollConfig::new(10, 1000)),
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(store.reads_for(&id("a")), 2);
        assert_eq!(store.reads_for(&id("b")), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poll_future_ends_the_session() {
        let store = Arc::new(MemoryStore::new());
        let poller = Poller::new(store.clone());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(1500),
            poller.poll(&id("abc"), PollConfig::new(100, 1000)),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(!poller.is_polling(&id("abc")));
        let reads = store.reads();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.reads(), reads);
    }

    #[test]
    fn timeout_message_names_the_cadence() {
        let err = PollError::Timeout {
            attempts: 60,
            interval: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("60 attempts"));
        assert!(msg.contains("every 5s"));
        assert!(msg.contains("try again"));

        let err = PollError::Timeout {
            attempts: 3,
            interval: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("every 250ms"));
    }
}
