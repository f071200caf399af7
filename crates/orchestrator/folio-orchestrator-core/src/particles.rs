//! Particle lifecycle: spawn bounded, randomized sets of decorative elements
//! into a container and guarantee every one of them is removed again.
//!
//! Lifetimes run on the manager's own clock (advanced by [`ParticleManager::update`])
//! so particles expire even when the motion engine never became ready.

use folio_motion_core::{
    easing::Curve, AnimationHandle, AnimationSpec, Easing, ElementId, MotionEngine,
    PropertyTween, RandomSource, Stage, Targets, Value,
};
use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleSetId(pub u32);

/// Ranges each particle draws from. Every particle draws independently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Kinematics {
    /// Element kind handed to [`Stage::create_child`].
    pub kind: String,
    pub drift_x: [f32; 2],
    pub drift_y: [f32; 2],
    pub scale: [f32; 2],
    pub opacity: [f32; 2],
    pub lifetime_ms: [f64; 2],
    pub easing: Easing,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::ambient()
    }
}

impl Kinematics {
    /// Slow floating dust for backgrounds and the loader.
    pub fn ambient() -> Self {
        Self {
            kind: "particle".into(),
            drift_x: [-60.0, 60.0],
            drift_y: [-120.0, -20.0],
            scale: [0.4, 1.2],
            opacity: [0.3, 0.8],
            lifetime_ms: [3000.0, 6000.0],
            easing: Easing::InOut(Curve::Sine),
        }
    }

    /// Fast outward scatter, used when the loader exits.
    pub fn burst() -> Self {
        Self {
            kind: "spark".into(),
            drift_x: [-240.0, 240.0],
            drift_y: [-240.0, 240.0],
            scale: [0.6, 1.4],
            opacity: [0.7, 1.0],
            lifetime_ms: [500.0, 900.0],
            easing: Easing::Out(Curve::Expo),
        }
    }

    /// Single expanding ring at a pointer position.
    pub fn ripple() -> Self {
        Self {
            kind: "ripple".into(),
            drift_x: [0.0, 0.0],
            drift_y: [0.0, 0.0],
            scale: [2.5, 3.5],
            opacity: [0.5, 0.6],
            lifetime_ms: [600.0, 700.0],
            easing: Easing::Out(Curve::Quad),
        }
    }

    fn draw(range: [f32; 2], rng: &mut dyn RandomSource) -> f32 {
        let (lo, hi) = if range[0] <= range[1] {
            (range[0], range[1])
        } else {
            (range[1], range[0])
        };
        if lo == hi {
            lo
        } else {
            rng.uniform(lo as f64, hi as f64) as f32
        }
    }

    fn draw_lifetime(&self, rng: &mut dyn RandomSource) -> f64 {
        let [lo, hi] = self.lifetime_ms;
        let (lo, hi) = (lo.min(hi).max(0.0), lo.max(hi).max(0.0));
        if lo == hi {
            lo
        } else {
            rng.uniform(lo, hi)
        }
    }
}

#[derive(Clone, Debug)]
struct Particle {
    element: ElementId,
    expires_at_ms: f64,
    handle: Option<AnimationHandle>,
}

#[derive(Clone, Debug)]
struct ParticleSet {
    container: ElementId,
    particles: Vec<Particle>,
}

/// Owns every live particle set. A retired set is forgotten entirely, so
/// retiring twice (or retiring an unknown id) is a no-op.
#[derive(Debug)]
pub struct ParticleManager {
    max_per_container: usize,
    interactive: bool,
    clock_ms: f64,
    next_id: u32,
    sets: IndexMap<ParticleSetId, ParticleSet>,
    by_container: HashMap<ElementId, Vec<ParticleSetId>>,
}

impl ParticleManager {
    pub fn new(max_per_container: usize, interactive: bool) -> Self {
        Self {
            max_per_container,
            interactive,
            clock_ms: 0.0,
            next_id: 0,
            sets: IndexMap::new(),
            by_container: HashMap::new(),
        }
    }

    /// Built from the engine's `particleCount` and `interactive` settings.
    pub fn for_engine(engine: &MotionEngine) -> Self {
        let cfg = engine.config();
        Self::new(cfg.particle_count, cfg.interactive)
    }

    pub fn max_per_container(&self) -> usize {
        self.max_per_container
    }

    pub fn live_count(&self, container: ElementId) -> usize {
        self.by_container
            .get(&container)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.sets.get(id))
                    .map(|s| s.particles.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn total_live(&self) -> usize {
        self.sets.values().map(|s| s.particles.len()).sum()
    }

    pub fn set_len(&self, id: ParticleSetId) -> Option<usize> {
        self.sets.get(&id).map(|s| s.particles.len())
    }

    /// Elements of a live set, in creation order.
    pub fn targets(&self, id: ParticleSetId) -> Targets {
        self.sets
            .get(&id)
            .map(|s| Targets::new(s.particles.iter().map(|p| p.element)))
            .unwrap_or_default()
    }

    /// Spawn up to `count` particles into `container`, clamped so the
    /// container never holds more than the configured maximum.
    pub fn spawn(
        &mut self,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
        container: ElementId,
        count: usize,
        kinematics: &Kinematics,
    ) -> ParticleSetId {
        self.spawn_at(engine, stage, container, count, kinematics, None)
    }

    /// One ripple at container-local `(x, y)`. Ignored unless interaction is on.
    pub fn ripple(
        &mut self,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
        container: ElementId,
        x: f32,
        y: f32,
    ) -> Option<ParticleSetId> {
        if !self.interactive {
            trace!(?container, "ripple ignored: interaction disabled");
            return None;
        }
        Some(self.spawn_at(
            engine,
            stage,
            container,
            1,
            &Kinematics::ripple(),
            Some((x, y)),
        ))
    }

    fn spawn_at(
        &mut self,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
        container: ElementId,
        count: usize,
        kinematics: &Kinematics,
        origin: Option<(f32, f32)>,
    ) -> ParticleSetId {
        let id = ParticleSetId(self.next_id);
        self.next_id += 1;

        let room = self
            .max_per_container
            .saturating_sub(self.live_count(container));
        let allowed = count.min(room);
        if allowed < count {
            debug!(
                ?container,
                requested = count,
                allowed,
                max = self.max_per_container,
                "particle spawn clamped"
            );
        }

        let speed = engine.speed_factor();
        let mut particles = Vec::with_capacity(allowed);
        for _ in 0..allowed {
            let Some(element) = stage.create_child(container, &kinematics.kind) else {
                debug!(?container, "particle container gone; spawn stopped");
                break;
            };
            let rng: &mut dyn RandomSource = &mut *engine;
            let dx = Kinematics::draw(kinematics.drift_x, rng);
            let dy = Kinematics::draw(kinematics.drift_y, rng);
            let scale = Kinematics::draw(kinematics.scale, rng);
            let opacity = Kinematics::draw(kinematics.opacity, rng);
            let lifetime = kinematics.draw_lifetime(rng);

            if let Some((x, y)) = origin {
                stage.write(element, "left", Value::Float(x));
                stage.write(element, "top", Value::Float(y));
            }
            stage.write(element, "opacity", Value::Float(opacity));

            let spec = AnimationSpec::new()
                .prop("translateX", PropertyTween::from_to(0.0, dx))
                .prop("translateY", PropertyTween::from_to(0.0, dy))
                .prop("scale", PropertyTween::from_to(0.0, scale))
                .prop("opacity", PropertyTween::from_to(opacity, 0.0))
                .duration(lifetime.max(1.0))
                .easing(kinematics.easing);
            let handle = engine.animate(element, &spec);
            particles.push(Particle {
                element,
                expires_at_ms: self.clock_ms + lifetime * speed,
                handle,
            });
        }

        trace!(?id, ?container, spawned = particles.len(), "particle set spawned");
        self.by_container.entry(container).or_default().push(id);
        self.sets.insert(
            id,
            ParticleSet {
                container,
                particles,
            },
        );
        id
    }

    /// Remove every element of the set. Returns false if it was already retired.
    pub fn retire(
        &mut self,
        id: ParticleSetId,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
    ) -> bool {
        let Some(set) = self.sets.shift_remove(&id) else {
            return false;
        };
        for p in &set.particles {
            if let Some(h) = p.handle {
                engine.cancel(h);
            }
        }
        for p in &set.particles {
            stage.remove(p.element);
        }
        self.forget(set.container, id);
        trace!(?id, removed = set.particles.len(), "particle set retired");
        true
    }

    /// Retire every set spawned into `container`. Returns how many were retired.
    pub fn teardown(
        &mut self,
        container: ElementId,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
    ) -> usize {
        let ids = self.by_container.remove(&container).unwrap_or_default();
        let mut retired = 0;
        for id in ids {
            if self.retire(id, engine, stage) {
                retired += 1;
            }
        }
        if retired > 0 {
            debug!(?container, sets = retired, "particles torn down");
        }
        retired
    }

    /// Advance the lifetime clock and remove expired particles. Sets that run
    /// empty are retired. Returns the number of elements removed.
    pub fn update(
        &mut self,
        dt_ms: f64,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
    ) -> usize {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.clock_ms += dt_ms;
        }
        let now = self.clock_ms;
        let mut removed = 0;
        let mut emptied = Vec::new();
        for (id, set) in self.sets.iter_mut() {
            set.particles.retain(|p| {
                if p.expires_at_ms > now {
                    return true;
                }
                if let Some(h) = p.handle {
                    engine.cancel(h);
                }
                stage.remove(p.element);
                removed += 1;
                false
            });
            if set.particles.is_empty() {
                emptied.push((*id, set.container));
            }
        }
        for (id, container) in emptied {
            self.sets.shift_remove(&id);
            self.forget(container, id);
        }
        removed
    }

    fn forget(&mut self, container: ElementId, id: ParticleSetId) {
        if let Some(ids) = self.by_container.get_mut(&container) {
            ids.retain(|x| *x != id);
            if ids.is_empty() {
                self.by_container.remove(&container);
            }
        }
    }
}
