//! Frame pass order for [`crate::Director`].

use folio_motion_core::Stage;

use crate::transition::TransitionCtx;
use crate::{Director, DirectorFrame, TransitionChange};

/// Run one frame:
///   engine tick -> loader transitions (reading this frame's events) -> particle expiry
pub fn run_frame(director: &mut Director, dt_ms: f64, stage: &mut dyn Stage) -> DirectorFrame {
    let motion = director.engine.tick(dt_ms, stage);

    let mut transitions = Vec::new();
    for (region, slot) in director.loaders.iter_mut() {
        let mut ctx = TransitionCtx {
            engine: &mut director.engine,
            particles: &mut director.particles,
            stage: &mut *stage,
        };
        if let Some(state) = slot.transition.tick(dt_ms, slot.signals, &motion, &mut ctx) {
            transitions.push(TransitionChange {
                region: *region,
                state,
            });
        }
    }

    let expired_particles = director
        .particles
        .update(dt_ms, &mut director.engine, stage);

    DirectorFrame {
        motion,
        transitions,
        expired_particles,
    }
}
