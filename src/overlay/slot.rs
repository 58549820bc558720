//! Visual slots for concurrently active overlays.
//!
//! A slot is a key no two active overlays share. Slots are handed out
//! lowest-free-first and returned on exit, so a lone overlay always lands in
//! slot 0.

use serde::{Deserialize, Serialize};

/// Slot key for an active overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlaySlot(pub usize);

impl OverlaySlot {
    /// Anchor of this slot inside the overlay container, in percent.
    #[must_use]
    pub fn anchor(self) -> OverlayAnchor {
        #[allow(clippy::cast_precision_loss)]
        let n = self.0 as f32;
        OverlayAnchor {
            top_pct: 20.0 + (n * 15.0) % 60.0,
            left_pct: 10.0 + (n * 20.0) % 70.0,
        }
    }
}

/// Top-left corner of an overlay bubble relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayAnchor {
    pub top_pct: f32,
    pub left_pct: f32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SlotAllocator {
    taken: Vec<bool>,
}

impl SlotAllocator {
    pub(crate) fn acquire(&mut self) -> OverlaySlot {
        if let Some(free) = self.taken.iter().position(|t| !t) {
            self.taken[free] = true;
            OverlaySlot(free)
        } else {
            self.taken.push(true);
            OverlaySlot(self.taken.len() - 1)
        }
    }

    pub(crate) fn release(&mut self, slot: OverlaySlot) {
        if let Some(t) = self.taken.get_mut(slot.0) {
            *t = false;
        }
        while self.taken.last() == Some(&false) {
            self.taken.pop();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.taken.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_lowest_free_slot() {
        let mut slots = SlotAllocator::default();
        let a = slots.acquire();
        let b = slots.acquire();
        let c = slots.acquire();
        assert_eq!((a, b, c), (OverlaySlot(0), OverlaySlot(1), OverlaySlot(2)));

        slots.release(b);
        assert_eq!(slots.acquire(), OverlaySlot(1));
        slots.release(c);
        slots.release(OverlaySlot(1));
        assert_eq!(slots.acquire(), OverlaySlot(1));
    }

    #[test]
    fn release_of_unknown_slot_is_harmless() {
        let mut slots = SlotAllocator::default();
        slots.release(OverlaySlot(7));
        assert_eq!(slots.acquire(), OverlaySlot(0));
    }

    #[test]
    fn anchors_stay_inside_the_player() {
        for n in 0..32 {
            let anchor = OverlaySlot(n).anchor();
            assert!((20.0..80.0).contains(&anchor.top_pct));
            assert!((10.0..80.0).contains(&anchor.left_pct));
        }
        assert_eq!(
            OverlaySlot(1).anchor(),
            OverlayAnchor { top_pct: 35.0, left_pct: 30.0 }
        );
    }
}
