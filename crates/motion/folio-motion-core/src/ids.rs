//! Identifiers and simple allocators for stage elements and running tweens.

use serde::{Deserialize, Serialize};

/// Opaque handle of a visual element owned by the host [`crate::Stage`].
///
/// The engine never owns elements; holding an `ElementId` does not keep the
/// element alive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TweenId(pub u32);

/// Monotonic allocator for TweenId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_tween: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_tween(&mut self) -> TweenId {
        let id = TweenId(self.next_tween);
        self.next_tween = self.next_tween.wrapping_add(1);
        id
    }

    /// Whether `id` has been handed out by this allocator.
    #[inline]
    pub fn issued(&self, id: TweenId) -> bool {
        id.0 < self.next_tween
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_tween(), TweenId(0));
        assert_eq!(alloc.alloc_tween(), TweenId(1));
        assert!(alloc.issued(TweenId(1)));
        assert!(!alloc.issued(TweenId(2)));
    }
}
