//! MotionEngine: the facade every effect goes through.
//!
//! - Owns the lazily acquired [`TweenPrimitive`] (`Idle → Loading → Ready | Failed`).
//! - Until the primitive is ready, every operation returns a safe default and
//!   bumps [`Diagnostics::not_ready_calls`]; nothing panics or propagates.
//! - Resolves specs into [`TweenRequest`]s: draws each `ValueSource` once per
//!   target, applies staggered delays in target order, and scales time by the
//!   configured [`crate::Speed`].

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MotionConfig;
use crate::easing::Easing;
use crate::error::{MotionError, Result};
use crate::events::{MotionEvent, MotionFrame};
use crate::ids::TweenId;
use crate::loader::{LoadPoll, PrimitiveLoader, ReadyAfter};
use crate::primitive::{TrackRequest, TweenPrimitive, TweenRequest, Tweener};
use crate::source::RandomSource;
use crate::spec::AnimationSpec;
use crate::stage::{Stage, Targets};
use crate::stagger::{Stagger, StaggerOptions, StaggerValue};
use crate::timeline::Timeline;

/// Handle to a running tween. Copyable; does not keep anything alive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationHandle {
    pub id: TweenId,
}

impl AnimationHandle {
    /// Stop all property mutation from this tween. Safe on finished tweens.
    pub fn pause(&self, engine: &mut MotionEngine) -> bool {
        engine.pause(*self)
    }

    pub fn play(&self, engine: &mut MotionEngine) -> bool {
        engine.play(*self)
    }

    /// Stop and release the tween. Not resumable.
    pub fn cancel(&self, engine: &mut MotionEngine) -> bool {
        engine.cancel(*self)
    }
}

/// Counters for degraded paths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub not_ready_calls: u64,
    pub construction_errors: u64,
    pub load_attempts: u32,
    pub cancelled_tweens: u64,
}

enum Resource {
    Idle(Box<dyn PrimitiveLoader>),
    Loading(Box<dyn PrimitiveLoader>),
    Ready(Box<dyn TweenPrimitive>),
    Failed { reason: String },
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Idle(_) => write!(f, "Idle"),
            Resource::Loading(_) => write!(f, "Loading"),
            Resource::Ready(p) => write!(f, "Ready({p:?})"),
            Resource::Failed { reason } => write!(f, "Failed({reason:?})"),
        }
    }
}

#[derive(Debug)]
pub struct MotionEngine {
    cfg: MotionConfig,
    resource: Resource,
    fallback_rng: StdRng,
    clock_ms: f64,
    diagnostics: Diagnostics,
}

impl MotionEngine {
    /// Engine that acquires its primitive from `loader` on first use.
    pub fn new(cfg: MotionConfig, loader: impl PrimitiveLoader + 'static) -> Self {
        let fallback_rng = cfg
            .seed
            .map(|s| StdRng::seed_from_u64(s ^ 0x5eed))
            .unwrap_or_else(StdRng::from_entropy);
        Self {
            cfg,
            resource: Resource::Idle(Box::new(loader)),
            fallback_rng,
            clock_ms: 0.0,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Engine with the in-crate [`Tweener`] loaded up front.
    pub fn ready(cfg: MotionConfig) -> Self {
        let seed = cfg.seed;
        let mut engine = Self::new(cfg, ReadyAfter::immediately());
        engine.resource = Resource::Ready(Box::new(Tweener::new(seed)));
        engine.diagnostics.load_attempts = 1;
        engine
    }

    #[inline]
    pub fn config(&self) -> &MotionConfig {
        &self.cfg
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Engine clock in ms (sum of all tick deltas).
    #[inline]
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    #[inline]
    pub fn speed_factor(&self) -> f64 {
        self.cfg.speed.multiplier()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.resource, Resource::Ready(_))
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.resource, Resource::Failed { .. })
    }

    pub fn active_tweens(&self) -> usize {
        match &self.resource {
            Resource::Ready(p) => p.active_count(),
            _ => 0,
        }
    }

    /// Move `Idle` to `Loading`. Only ever happens once.
    fn begin_load(&mut self) {
        if !matches!(self.resource, Resource::Idle(_)) {
            return;
        }
        let placeholder = Resource::Failed {
            reason: String::new(),
        };
        if let Resource::Idle(loader) = std::mem::replace(&mut self.resource, placeholder) {
            self.diagnostics.load_attempts += 1;
            debug!("motion primitive load started");
            self.resource = Resource::Loading(loader);
        }
    }

    /// Poll the loader once if a load is in flight. Returns readiness.
    pub fn poll_load(&mut self) -> bool {
        self.begin_load();
        if !matches!(self.resource, Resource::Loading(_)) {
            return self.is_ready();
        }
        let placeholder = Resource::Failed {
            reason: String::new(),
        };
        if let Resource::Loading(mut loader) = std::mem::replace(&mut self.resource, placeholder) {
            self.resource = match loader.poll() {
                LoadPoll::Pending => Resource::Loading(loader),
                LoadPoll::Ready(primitive) => {
                    info!("motion primitive ready");
                    Resource::Ready(primitive)
                }
                LoadPoll::Failed(reason) => {
                    warn!(%reason, "motion primitive failed to load; effects stay disabled");
                    Resource::Failed { reason }
                }
            };
        }
        self.is_ready()
    }

    fn note_not_ready(&mut self, op: &'static str) {
        self.diagnostics.not_ready_calls += 1;
        debug!(op, error = %MotionError::EngineNotReady, "returning fallback");
    }

    fn note_construction(&mut self, op: &'static str, err: &MotionError) {
        self.diagnostics.construction_errors += 1;
        warn!(op, error = %err, "effect construction failed");
    }

    /// Start `spec` on `targets`. `None` when the engine is not ready or the
    /// spec cannot be built.
    pub fn animate(
        &mut self,
        targets: impl Into<Targets>,
        spec: &AnimationSpec,
    ) -> Option<AnimationHandle> {
        self.animate_at(&targets.into(), spec, 0.0)
    }

    /// Like [`Self::animate`], starting `offset_ms` (already speed-scaled) from now.
    pub fn animate_at(
        &mut self,
        targets: &Targets,
        spec: &AnimationSpec,
        offset_ms: f64,
    ) -> Option<AnimationHandle> {
        self.begin_load();
        if !self.is_ready() {
            self.note_not_ready("animate");
            return None;
        }
        let request = match self.build_request(targets, spec, offset_ms) {
            Ok(r) => r,
            Err(err) => {
                self.note_construction("animate", &err);
                return None;
            }
        };
        let result = match &mut self.resource {
            Resource::Ready(p) => p.animate(request),
            _ => return None,
        };
        match result {
            Ok(id) => Some(AnimationHandle { id }),
            Err(err) => {
                self.note_construction("animate", &err);
                None
            }
        }
    }

    fn build_request(
        &mut self,
        targets: &Targets,
        spec: &AnimationSpec,
        offset_ms: f64,
    ) -> Result<TweenRequest> {
        spec.validate()?;
        if !(offset_ms.is_finite() && offset_ms >= 0.0) {
            return Err(MotionError::construction(format!("invalid offset {offset_ms}")));
        }
        let speed = self.speed_factor();
        let count = targets.len();
        let rng: &mut dyn RandomSource = self;
        let mut tracks = Vec::with_capacity(count);
        for (index, target) in targets.iter().enumerate() {
            let delay_ms = offset_ms + spec.delay.delay_for(index, count) * speed;
            let mut properties = Vec::with_capacity(spec.properties.len());
            for (name, tween) in &spec.properties {
                // Drawn per target, never shared across targets.
                let from = tween.from.as_ref().map(|f| f.evaluate(&mut *rng));
                let to = tween.to.evaluate(&mut *rng);
                properties.push((name.clone(), from, to));
            }
            tracks.push(TrackRequest {
                target,
                delay_ms,
                properties,
            });
        }
        Ok(TweenRequest {
            tracks,
            duration_ms: spec.duration * speed,
            end_delay_ms: spec.end_delay * speed,
            easing: spec.easing,
            looping: spec.looping,
            direction: spec.direction,
        })
    }

    /// A fresh timeline, or `None` while the engine is not ready.
    pub fn timeline(&mut self) -> Option<Timeline> {
        self.begin_load();
        if !self.is_ready() {
            self.note_not_ready("timeline");
            return None;
        }
        Some(Timeline::new())
    }

    pub fn stagger(&mut self, value: impl Into<StaggerValue>, options: StaggerOptions) -> Stagger {
        self.begin_load();
        match &self.resource {
            Resource::Ready(p) => p.stagger(value.into(), options),
            _ => {
                self.note_not_ready("stagger");
                Stagger::zero()
            }
        }
    }

    /// Uniform draw in `[min, max)`. Uses a local generator until ready.
    pub fn random(&mut self, min: f64, max: f64) -> f64 {
        self.begin_load();
        if !self.is_ready() {
            self.note_not_ready("random");
        }
        self.uniform(min, max)
    }

    /// Resolve an easing by name; unknown names fall back to [`Easing::default`].
    pub fn easing(&mut self, name: &str, args: &[f32]) -> Easing {
        self.begin_load();
        let resolved = match &self.resource {
            Resource::Ready(p) => p.easing(name, args),
            _ => {
                self.note_not_ready("easing");
                return Easing::default();
            }
        };
        resolved.unwrap_or_else(|err| {
            warn!(error = %err, "falling back to default easing");
            Easing::default()
        })
    }

    pub fn pause(&mut self, handle: AnimationHandle) -> bool {
        match &mut self.resource {
            Resource::Ready(p) => p.pause(handle.id),
            _ => false,
        }
    }

    /// Remove the tween from the primitive; reported as `Cancelled` next tick.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        match &mut self.resource {
            Resource::Ready(p) => p.cancel(handle.id),
            _ => false,
        }
    }

    pub fn play(&mut self, handle: AnimationHandle) -> bool {
        match &mut self.resource {
            Resource::Ready(p) => p.play(handle.id),
            _ => false,
        }
    }

    /// Completed, cancelled, or unknown to a not-ready engine.
    pub fn is_finished(&self, handle: AnimationHandle) -> bool {
        match &self.resource {
            Resource::Ready(p) => p.is_finished(handle.id),
            _ => true,
        }
    }

    /// Frame callback: advance the load, then every running tween.
    pub fn tick(&mut self, dt_ms: f64, stage: &mut dyn Stage) -> MotionFrame {
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        self.clock_ms += dt_ms;
        self.poll_load();
        let mut events = Vec::new();
        if let Resource::Ready(p) = &mut self.resource {
            p.tick(dt_ms, stage, &mut events);
        }
        self.diagnostics.cancelled_tweens += events
            .iter()
            .filter(|e| matches!(e, MotionEvent::Cancelled { .. }))
            .count() as u64;
        MotionFrame {
            clock_ms: self.clock_ms,
            dt_ms,
            events,
        }
    }
}

impl RandomSource for MotionEngine {
    /// Primitive's generator once ready, local generator before. No diagnostics.
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        match &mut self.resource {
            Resource::Ready(p) => p.random(min, max),
            _ => self.fallback_rng.uniform(min, max),
        }
    }
}
