//! folio-orchestrator
//!
//! Site-level choreography on top of `folio_motion_core`: particle sets,
//! scroll-triggered reveals, the loading-screen transition and decorative
//! morph loops, all advanced together by [`Director::step`].

pub mod particles;
pub mod recipes;
pub mod scheduler;
pub mod transition;
pub mod visibility;

use anyhow::{Context, Result};
use folio_motion_core::{
    AnimationHandle, ElementId, MotionConfig, MotionEngine, MotionFrame, PrimitiveLoader, Stage,
};
use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use crate::particles::{Kinematics, ParticleManager, ParticleSetId};
pub use crate::recipes::{Recipe, RecipeStep, Roles};
pub use crate::transition::{
    LoaderScript, LoaderTransition, LoadingSignals, TransitionCtx, TransitionState,
};
pub use crate::visibility::{ObserverSupport, RegionId, RegionState, ScrollRegion, VisibilityController};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionChange {
    pub region: ElementId,
    pub state: TransitionState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorFrame {
    pub motion: MotionFrame,
    /// Loader state changes made this frame, in mount order.
    pub transitions: Vec<TransitionChange>,
    /// Particle elements removed because their lifetime ran out.
    pub expired_particles: usize,
}

/// What [`Director::teardown`] released.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    pub particle_sets: usize,
    pub regions: usize,
    pub loops: usize,
    pub loaders: usize,
}

#[derive(Debug)]
struct LoaderSlot {
    transition: LoaderTransition,
    signals: LoadingSignals,
}

#[derive(Debug)]
pub struct Director {
    pub engine: MotionEngine,
    pub particles: ParticleManager,
    pub visibility: VisibilityController,
    loaders: IndexMap<ElementId, LoaderSlot>,
    /// Morph loops keyed by owning container.
    loops: HashMap<ElementId, Vec<AnimationHandle>>,
}

impl Director {
    pub fn new(
        cfg: MotionConfig,
        loader: impl PrimitiveLoader + 'static,
        support: ObserverSupport,
    ) -> Self {
        Self::with_engine(MotionEngine::new(cfg, loader), support)
    }

    pub fn with_engine(engine: MotionEngine, support: ObserverSupport) -> Self {
        Self {
            particles: ParticleManager::for_engine(&engine),
            visibility: VisibilityController::new(support),
            engine,
            loaders: IndexMap::new(),
            loops: HashMap::new(),
        }
    }

    /// Build from a JSON [`MotionConfig`].
    pub fn from_config_json(
        json: &str,
        loader: impl PrimitiveLoader + 'static,
        support: ObserverSupport,
    ) -> Result<Self> {
        let cfg = MotionConfig::from_json(json).context("load motion config")?;
        Ok(Self::new(cfg, loader, support))
    }

    pub fn config(&self) -> &MotionConfig {
        self.engine.config()
    }

    /// Mount the loading screen in `region` with the built-in script.
    pub fn mount_loader(&mut self, region: ElementId, roles: Roles, stage: &mut dyn Stage) {
        self.mount_loader_with(region, roles, LoaderScript::default(), stage);
    }

    /// Mount with a custom script. Unless the host bound a `particles` role,
    /// ambient particles fill half the container's budget and are bound to it.
    pub fn mount_loader_with(
        &mut self,
        region: ElementId,
        mut roles: Roles,
        script: LoaderScript,
        stage: &mut dyn Stage,
    ) {
        if self.loaders.contains_key(&region) {
            debug!(?region, "loader already mounted");
            return;
        }
        if roles.get("particles").is_none() {
            let count = self.particles.max_per_container() / 2;
            if count > 0 {
                let set = self.particles.spawn(
                    &mut self.engine,
                    stage,
                    region,
                    count,
                    &Kinematics::ambient(),
                );
                roles.insert("particles", self.particles.targets(set));
            }
        }
        let mut ctx = TransitionCtx {
            engine: &mut self.engine,
            particles: &mut self.particles,
            stage,
        };
        let transition = LoaderTransition::mount(region, roles, script, &mut ctx);
        self.loaders.insert(
            region,
            LoaderSlot {
                transition,
                signals: LoadingSignals::loading(),
            },
        );
    }

    /// Latest host loading flags for a mounted loader. Ignored once removed.
    pub fn set_signals(&mut self, region: ElementId, signals: LoadingSignals) {
        if let Some(slot) = self.loaders.get_mut(&region) {
            if !slot.transition.is_removed() {
                slot.signals = signals;
            }
        }
    }

    pub fn loader(&self, region: ElementId) -> Option<&LoaderTransition> {
        self.loaders.get(&region).map(|s| &s.transition)
    }

    pub fn register_region(&mut self, region: ScrollRegion, stage: &mut dyn Stage) -> RegionId {
        self.visibility.register(region, &mut self.engine, stage)
    }

    pub fn observe(&mut self, id: RegionId, ratio: f32, stage: &mut dyn Stage) -> bool {
        self.visibility.observe(id, ratio, &mut self.engine, stage)
    }

    pub fn spawn_particles(
        &mut self,
        container: ElementId,
        count: usize,
        kinematics: &Kinematics,
        stage: &mut dyn Stage,
    ) -> ParticleSetId {
        self.particles
            .spawn(&mut self.engine, stage, container, count, kinematics)
    }

    /// Pointer interaction at container-local `(x, y)`.
    pub fn ripple(
        &mut self,
        container: ElementId,
        x: f32,
        y: f32,
        stage: &mut dyn Stage,
    ) -> Option<ParticleSetId> {
        self.particles
            .ripple(&mut self.engine, stage, container, x, y)
    }

    /// Start the endless morph on `shape`. `None` when morphing is disabled
    /// or the engine cannot run it yet.
    pub fn start_morphing(
        &mut self,
        container: ElementId,
        shape: ElementId,
    ) -> Option<AnimationHandle> {
        if !self.engine.config().morphing_shapes {
            trace!(?shape, "morphing disabled");
            return None;
        }
        let handle = self.engine.animate(shape, &Recipe::morph_loop())?;
        self.loops.entry(container).or_default().push(handle);
        Some(handle)
    }

    /// Advance one frame. See [`scheduler::run_frame`] for pass order.
    pub fn step(&mut self, dt_ms: f64, stage: &mut dyn Stage) -> DirectorFrame {
        scheduler::run_frame(self, dt_ms, stage)
    }

    /// Release everything owned by `container`: particles first, then scroll
    /// regions, morph loops and finally a loader mounted on it.
    pub fn teardown(&mut self, container: ElementId, stage: &mut dyn Stage) -> TeardownReport {
        let mut report = TeardownReport {
            particle_sets: self.particles.teardown(container, &mut self.engine, stage),
            regions: self.visibility.teardown(container, &mut self.engine),
            ..TeardownReport::default()
        };
        if let Some(handles) = self.loops.remove(&container) {
            for h in &handles {
                self.engine.cancel(*h);
            }
            report.loops = handles.len();
        }
        if let Some(mut slot) = self.loaders.shift_remove(&container) {
            let mut ctx = TransitionCtx {
                engine: &mut self.engine,
                particles: &mut self.particles,
                stage,
            };
            slot.transition.withdraw(&mut ctx);
            report.loaders = 1;
        }
        debug!(?container, ?report, "container torn down");
        report
    }
}
