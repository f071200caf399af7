//! Output contracts from the engine.
//!
//! Callbacks are replaced by events: hosts and orchestrators read the
//! [`MotionFrame`] returned by each tick and react to the tweens they own.

use serde::{Deserialize, Serialize};

use crate::ids::TweenId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionEvent {
    /// First frame on which the tween advanced.
    Began { tween: TweenId },
    /// Emitted every frame the tween advances. `progress` is 0..=1 over the whole
    /// tween, or over the current iteration for infinite loops.
    Update { tween: TweenId, progress: f32 },
    LoopCompleted { tween: TweenId, iteration: u32 },
    Completed { tween: TweenId },
    /// Every target of the tween disappeared from the stage.
    Cancelled { tween: TweenId },
}

impl MotionEvent {
    pub fn tween(&self) -> TweenId {
        match self {
            MotionEvent::Began { tween }
            | MotionEvent::Update { tween, .. }
            | MotionEvent::LoopCompleted { tween, .. }
            | MotionEvent::Completed { tween }
            | MotionEvent::Cancelled { tween } => *tween,
        }
    }
}

/// Everything one engine tick produced.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MotionFrame {
    /// Engine clock after this tick, in ms.
    pub clock_ms: f64,
    pub dt_ms: f64,
    #[serde(default)]
    pub events: Vec<MotionEvent>,
}

impl MotionFrame {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_for(&self, tween: TweenId) -> impl Iterator<Item = &MotionEvent> {
        self.events.iter().filter(move |e| e.tween() == tween)
    }

    pub fn completed(&self, tween: TweenId) -> bool {
        self.events_for(tween)
            .any(|e| matches!(e, MotionEvent::Completed { .. }))
    }
}
