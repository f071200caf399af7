//! Scroll-triggered reveals.
//!
//! Each registered region is `Armed` until its visible ratio crosses the
//! threshold, then `Fired`. Hosts feed intersection ratios through
//! [`VisibilityController::observe`]; without an observer every region fires
//! once at registration so nothing stays hidden.

use folio_motion_core::{ElementId, MotionEngine, MotionError, Stage, Timeline};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::recipes::{Recipe, Roles};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObserverSupport {
    Available,
    Unavailable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionState {
    Unarmed,
    Armed,
    Fired,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// A watched element and the reveal it plays.
#[derive(Clone, Debug)]
pub struct ScrollRegion {
    pub element: ElementId,
    /// Owner used by [`VisibilityController::teardown`]; defaults to `element`.
    pub container: ElementId,
    /// Visible fraction in `[0, 1]` that counts as "in view".
    pub threshold: f32,
    pub once: bool,
    pub recipe: Recipe,
    pub roles: Roles,
}

impl ScrollRegion {
    pub fn new(element: ElementId, recipe: Recipe) -> Self {
        Self {
            element,
            container: element,
            threshold: 0.2,
            once: true,
            recipe,
            roles: Roles::new(),
        }
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    pub fn in_container(mut self, container: ElementId) -> Self {
        self.container = container;
        self
    }

    fn is_visible(&self, ratio: f32) -> bool {
        ratio > 0.0 && ratio >= self.threshold
    }

    /// Roles with every selector the host left unbound pointing at the region itself.
    fn resolved_roles(&self) -> Roles {
        let mut roles = self.roles.clone();
        for step in &self.recipe.steps {
            if roles.get(&step.select).is_none() {
                roles.insert(step.select.clone(), self.element);
            }
        }
        roles
    }
}

#[derive(Debug)]
struct Entry {
    region: ScrollRegion,
    state: RegionState,
    was_visible: bool,
    fire_count: u32,
    run: Option<Timeline>,
}

#[derive(Debug)]
pub struct VisibilityController {
    support: ObserverSupport,
    next_id: u32,
    regions: IndexMap<RegionId, Entry>,
}

impl VisibilityController {
    pub fn new(support: ObserverSupport) -> Self {
        Self {
            support,
            next_id: 0,
            regions: IndexMap::new(),
        }
    }

    pub fn support(&self) -> ObserverSupport {
        self.support
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Arm a region. Without observer support it fires immediately.
    pub fn register(
        &mut self,
        region: ScrollRegion,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
    ) -> RegionId {
        let id = RegionId(self.next_id);
        self.next_id += 1;
        let mut entry = Entry {
            region,
            state: RegionState::Armed,
            was_visible: false,
            fire_count: 0,
            run: None,
        };
        debug!(?id, element = ?entry.region.element, "scroll region armed");
        if self.support == ObserverSupport::Unavailable {
            warn!(?id, error = %MotionError::ObserverUnavailable, "revealing immediately");
            fire(id, &mut entry, engine, stage);
        }
        self.regions.insert(id, entry);
        id
    }

    /// Feed the latest visible ratio. Returns whether the region fired.
    pub fn observe(
        &mut self,
        id: RegionId,
        ratio: f32,
        engine: &mut MotionEngine,
        stage: &mut dyn Stage,
    ) -> bool {
        if self.support == ObserverSupport::Unavailable {
            return false;
        }
        let Some(entry) = self.regions.get_mut(&id) else {
            return false;
        };
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        let visible = entry.region.is_visible(ratio);
        let crossed = visible && !entry.was_visible;
        entry.was_visible = visible;
        match entry.state {
            RegionState::Armed if crossed => {
                fire(id, entry, engine, stage);
                true
            }
            RegionState::Fired if !entry.region.once && !visible => {
                entry.state = RegionState::Armed;
                false
            }
            _ => false,
        }
    }

    /// Stop watching a region and release its running reveal.
    pub fn unregister(&mut self, id: RegionId, engine: &mut MotionEngine) -> bool {
        match self.regions.shift_remove(&id) {
            Some(mut entry) => {
                if let Some(run) = entry.run.as_mut() {
                    run.cancel(engine);
                }
                debug!(?id, "scroll region unregistered");
                true
            }
            None => false,
        }
    }

    /// Unregister every region owned by `container`.
    pub fn teardown(&mut self, container: ElementId, engine: &mut MotionEngine) -> usize {
        let ids: Vec<RegionId> = self
            .regions
            .iter()
            .filter(|(_, e)| e.region.container == container)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter(|id| self.unregister(*id, engine))
            .count()
    }

    pub fn state(&self, id: RegionId) -> RegionState {
        self.regions
            .get(&id)
            .map(|e| e.state)
            .unwrap_or(RegionState::Unarmed)
    }

    pub fn fire_count(&self, id: RegionId) -> u32 {
        self.regions.get(&id).map(|e| e.fire_count).unwrap_or(0)
    }
}

fn fire(id: RegionId, entry: &mut Entry, engine: &mut MotionEngine, stage: &mut dyn Stage) {
    if let Some(previous) = entry.run.as_mut() {
        previous.cancel(engine);
    }
    let roles = entry.region.resolved_roles();
    let mut run = entry.region.recipe.timeline(&roles);
    if !run.play(engine) {
        entry.region.recipe.apply_final(&roles, stage, engine);
    }
    entry.run = Some(run);
    entry.state = RegionState::Fired;
    entry.fire_count += 1;
    debug!(?id, count = entry.fire_count, recipe = %entry.region.recipe.name, "scroll region fired");
}
