//! Overlay synchronization.
//!
//! Maps a playback time to the set of claims whose display window contains
//! it and reports edge-triggered enter/exit events between ticks.
//!
//! A claim at timestamp `ts` is active at time `t` when `|t - ts| < window`.
//! Membership is recomputed from the absolute time on every tick, so seeks
//! in either direction behave like any other tick: claims jumped into get an
//! `Enter`, only claims that were active get an `Exit`, and windows skipped
//! over produce nothing.
//!
//! Claim identity is the index in the [`ClaimSet`]; timestamps may repeat.

mod slot;

use std::sync::Arc;

use crate::claims::ClaimSet;

pub use slot::{OverlayAnchor, OverlaySlot};
use slot::SlotAllocator;

/// Transition of one claim's overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    Enter { index: usize, slot: OverlaySlot },
    Exit { index: usize, slot: OverlaySlot },
}

impl OverlayEvent {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Enter { index, .. } | Self::Exit { index, .. } => *index,
        }
    }

    #[must_use]
    pub fn slot(&self) -> OverlaySlot {
        match self {
            Self::Enter { slot, .. } | Self::Exit { slot, .. } => *slot,
        }
    }
}

/// Tracks which claims are on screen for one player.
#[derive(Debug, Clone)]
pub struct OverlaySynchronizer {
    claims: Arc<ClaimSet>,
    window_secs: f64,
    /// Slot per claim index while active
    active: Vec<Option<OverlaySlot>>,
    slots: SlotAllocator,
}

impl OverlaySynchronizer {
    #[must_use]
    pub fn new(claims: Arc<ClaimSet>, window_secs: f64) -> Self {
        let active = vec![None; claims.len()];
        Self {
            claims,
            window_secs,
            active,
            slots: SlotAllocator::default(),
        }
    }

    #[must_use]
    pub fn claims(&self) -> &Arc<ClaimSet> {
        &self.claims
    }

    /// Recompute membership at `time` and return the transitions since the
    /// previous tick. Exits come first so freed slots can be reused by the
    /// enters of the same tick.
    ///
    /// A non-finite `time` is ignored.
    pub fn tick(&mut self, time: f64) -> Vec<OverlayEvent> {
        if !time.is_finite() {
            tracing::debug!(time, "Ignoring non-finite playback time");
            return Vec::new();
        }

        let should_show: Vec<bool> = self
            .claims
            .iter()
            .map(|claim| (time - claim.timestamp).abs() < self.window_secs)
            .collect();

        let mut events = Vec::new();

        for (index, show) in should_show.iter().enumerate() {
            if !show {
                if let Some(slot) = self.active[index].take() {
                    self.slots.release(slot);
                    events.push(OverlayEvent::Exit { index, slot });
                }
            }
        }

        for (index, show) in should_show.iter().enumerate() {
            if *show && self.active[index].is_none() {
                let slot = self.slots.acquire();
                self.active[index] = Some(slot);
                events.push(OverlayEvent::Enter { index, slot });
            }
        }

        events
    }

    /// Indices of the claims currently shown, ascending.
    #[must_use]
    pub fn active_indices(&self) -> Vec<usize> {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|_| i))
            .collect()
    }

    #[must_use]
    pub fn slot_of(&self, index: usize) -> Option<OverlaySlot> {
        self.active.get(index).copied().flatten()
    }

    /// Forget all active overlays without emitting events.
    pub fn reset(&mut self) {
        self.active.iter_mut().for_each(|slot| *slot = None);
        self.slots.clear();
    }

    /// Swap in a new claim set; the active set starts empty.
    pub fn replace_claims(&mut self, claims: Arc<ClaimSet>) {
        self.active = vec![None; claims.len()];
        self.claims = claims;
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claim, Verdict};

    fn claims_at(timestamps: &[f64]) -> Arc<ClaimSet> {
        Arc::new(ClaimSet::new(
            timestamps
                .iter()
                .map(|&t| Claim::new(t, Verdict::Misleading, "claim", "because"))
                .collect(),
        ))
    }

    fn entered(events: &[OverlayEvent]) -> Vec<usize> {
        events
            .iter()
            .filter(|e| matches!(e, OverlayEvent::Enter { .. }))
            .map(OverlayEvent::index)
            .collect()
    }

    fn exited(events: &[OverlayEvent]) -> Vec<usize> {
        events
            .iter()
            .filter(|e| matches!(e, OverlayEvent::Exit { .. }))
            .map(OverlayEvent::index)
            .collect()
    }

    #[test]
    fn overlapping_claims_enter_and_exit_together() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0, 10.0, 50.0]), 3.0);

        let events = sync.tick(9.0);
        assert_eq!(entered(&events), vec![0, 1]);
        assert_eq!(sync.active_indices(), vec![0, 1]);

        let events = sync.tick(13.1);
        assert_eq!(exited(&events), vec![0, 1]);
        assert!(entered(&events).is_empty());
        assert!(sync.active_indices().is_empty());
    }

    #[test]
    fn seek_into_window_enters_without_orphan_exits() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0, 10.0, 50.0]), 3.0);

        assert!(sync.tick(0.0).is_empty());
        let events = sync.tick(50.0);
        assert_eq!(events.len(), 1);
        assert_eq!(entered(&events), vec![2]);
        assert!(exited(&events).is_empty());
    }

    #[test]
    fn seek_backwards_recomputes_from_scratch() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0, 50.0]), 3.0);

        sync.tick(50.0);
        let events = sync.tick(11.0);
        assert_eq!(exited(&events), vec![1]);
        assert_eq!(entered(&events), vec![0]);
    }

    #[test]
    fn staying_inside_window_emits_nothing() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0]), 3.0);

        assert_eq!(entered(&sync.tick(8.0)), vec![0]);
        assert!(sync.tick(8.5).is_empty());
        assert!(sync.tick(11.0).is_empty());
        // sampling paused and resumed at the same position
        assert!(sync.tick(11.0).is_empty());
    }

    #[test]
    fn window_edges_are_exclusive() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0]), 3.0);
        assert!(sync.tick(7.0).is_empty());
        assert!(sync.tick(13.0).is_empty());
        assert_eq!(entered(&sync.tick(7.01)), vec![0]);
    }

    #[test]
    fn concurrent_overlays_never_share_a_slot() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0, 11.0, 12.0, 13.0]), 3.0);

        sync.tick(11.5);
        let mut slots: Vec<_> = sync
            .active_indices()
            .into_iter()
            .map(|i| sync.slot_of(i).unwrap())
            .collect();
        let before = slots.len();
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), before);
        assert_eq!(before, 4);
    }

    #[test]
    fn freed_slot_is_reused_in_the_same_tick() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0, 16.0]), 3.0);

        let first = sync.tick(10.0);
        assert_eq!(first, vec![OverlayEvent::Enter { index: 0, slot: OverlaySlot(0) }]);

        let second = sync.tick(15.0);
        assert_eq!(
            second,
            vec![
                OverlayEvent::Exit { index: 0, slot: OverlaySlot(0) },
                OverlayEvent::Enter { index: 1, slot: OverlaySlot(0) },
            ]
        );
    }

    #[test]
    fn reset_clears_without_events() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0]), 3.0);
        sync.tick(10.0);
        sync.reset();
        assert!(sync.active_indices().is_empty());
        // re-entering after reset fires a fresh enter
        assert_eq!(entered(&sync.tick(10.0)), vec![0]);
    }

    #[test]
    fn replacing_claims_starts_empty() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0]), 3.0);
        sync.tick(10.0);
        sync.replace_claims(claims_at(&[1.0, 2.0]));
        assert!(sync.active_indices().is_empty());
        assert_eq!(entered(&sync.tick(1.5)), vec![0, 1]);
    }

    #[test]
    fn non_finite_time_is_ignored() {
        let mut sync = OverlaySynchronizer::new(claims_at(&[10.0]), 3.0);
        sync.tick(10.0);
        assert!(sync.tick(f64::NAN).is_empty());
        assert_eq!(sync.active_indices(), vec![0]);
    }

    #[test]
    fn empty_claim_set_never_emits() {
        let mut sync = OverlaySynchronizer::new(Arc::new(ClaimSet::default()), 3.0);
        assert!(sync.tick(0.0).is_empty());
        assert!(sync.tick(100.0).is_empty());
    }
}
