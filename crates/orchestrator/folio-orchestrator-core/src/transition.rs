//! Loading-screen transition: ENTERING → ACTIVE → EXITING → REMOVED.
//!
//! Phase lengths come from the recipes' scheduled durations and are timed on
//! the transition's own clock, so the sequence completes even when the motion
//! engine never loads. At most one state change happens per tick.

use std::fmt;

use folio_motion_core::{
    AnimationHandle, AnimationSpec, ElementId, MotionEngine, MotionEvent, MotionFrame, Stage,
    Timeline, Value,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::particles::{Kinematics, ParticleManager};
use crate::recipes::{Recipe, Roles};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionState {
    Entering,
    Active,
    Exiting,
    Removed,
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionState::Entering => "ENTERING",
            TransitionState::Active => "ACTIVE",
            TransitionState::Exiting => "EXITING",
            TransitionState::Removed => "REMOVED",
        };
        f.write_str(s)
    }
}

/// Host loading flags, sampled every tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingSignals {
    pub is_loading: bool,
    pub content_loaded: bool,
}

impl LoadingSignals {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            content_loaded: false,
        }
    }

    pub fn done() -> Self {
        Self {
            is_loading: false,
            content_loaded: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.content_loaded && !self.is_loading
    }
}

/// Recipes and particle settings for one loader.
#[derive(Clone, Debug)]
pub struct LoaderScript {
    pub entrance: Recipe,
    pub progress: AnimationSpec,
    pub exit: Recipe,
    /// Particles scattered when the loader exits; zero disables the burst.
    pub burst_count: usize,
    pub burst: Kinematics,
}

impl Default for LoaderScript {
    fn default() -> Self {
        Self {
            entrance: Recipe::loader_entrance(),
            progress: Recipe::loader_progress(),
            exit: Recipe::loader_exit(),
            burst_count: 12,
            burst: Kinematics::burst(),
        }
    }
}

/// Mutable context a transition needs while advancing.
pub struct TransitionCtx<'a> {
    pub engine: &'a mut MotionEngine,
    pub particles: &'a mut ParticleManager,
    pub stage: &'a mut dyn Stage,
}

#[derive(Debug)]
pub struct LoaderTransition {
    region: ElementId,
    roles: Roles,
    script: LoaderScript,
    state: TransitionState,
    history: Vec<TransitionState>,
    progress: f32,
    phase_elapsed_ms: f64,
    phase_len_ms: f64,
    run: Option<Timeline>,
    progress_tween: Option<AnimationHandle>,
}

impl LoaderTransition {
    /// Mount the loader in `region` and start the entrance.
    pub fn mount(
        region: ElementId,
        roles: Roles,
        script: LoaderScript,
        ctx: &mut TransitionCtx<'_>,
    ) -> Self {
        let roles = roles.with("region", region);
        let mut t = Self {
            region,
            roles,
            script,
            state: TransitionState::Entering,
            history: vec![TransitionState::Entering],
            progress: 0.0,
            phase_elapsed_ms: 0.0,
            phase_len_ms: 0.0,
            run: None,
            progress_tween: None,
        };
        let entrance = t.script.entrance.clone();
        t.play_phase(&entrance, ctx);
        info!(?region, "loader mounted");
        t
    }

    pub fn region(&self) -> ElementId {
        self.region
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[TransitionState] {
        &self.history
    }

    /// Displayed progress in `[0, 100]`; never decreases.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_removed(&self) -> bool {
        self.state == TransitionState::Removed
    }

    /// Advance by one frame. Returns the new state if it changed.
    pub fn tick(
        &mut self,
        dt_ms: f64,
        signals: LoadingSignals,
        frame: &MotionFrame,
        ctx: &mut TransitionCtx<'_>,
    ) -> Option<TransitionState> {
        if self.state == TransitionState::Removed {
            return None;
        }
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.phase_elapsed_ms += dt_ms;
        }
        match self.state {
            TransitionState::Entering => {
                if self.phase_elapsed_ms >= self.phase_len_ms {
                    self.enter_active(ctx);
                    return Some(self.state);
                }
            }
            TransitionState::Active => {
                self.read_progress(frame);
                if signals.is_ready() {
                    if self.progress >= 100.0 {
                        self.enter_exiting(ctx);
                        return Some(self.state);
                    }
                    self.finish_progress(ctx);
                }
            }
            TransitionState::Exiting => {
                if self.phase_elapsed_ms >= self.phase_len_ms {
                    self.enter_removed(ctx);
                    return Some(self.state);
                }
            }
            TransitionState::Removed => {}
        }
        None
    }

    /// Withdraw immediately, skipping the exit animation.
    pub fn withdraw(&mut self, ctx: &mut TransitionCtx<'_>) {
        if self.state != TransitionState::Removed {
            self.enter_removed(ctx);
        }
    }

    fn set_state(&mut self, state: TransitionState) {
        debug!(region = ?self.region, from = %self.state, to = %state, "loader transition");
        self.state = state;
        self.history.push(state);
        self.phase_elapsed_ms = 0.0;
        self.phase_len_ms = 0.0;
    }

    /// Play a recipe and time the phase by its scheduled length. Without a
    /// ready engine the recipe's end state is applied and the phase is instant.
    fn play_phase(&mut self, recipe: &Recipe, ctx: &mut TransitionCtx<'_>) {
        if let Some(previous) = self.run.as_mut() {
            previous.cancel(ctx.engine);
        }
        let mut run = recipe.timeline(&self.roles);
        if run.play(ctx.engine) {
            self.phase_len_ms = run.duration_ms(ctx.engine.speed_factor());
        } else {
            recipe.apply_final(&self.roles, ctx.stage, ctx.engine);
            self.phase_len_ms = 0.0;
        }
        self.run = Some(run);
    }

    fn enter_active(&mut self, ctx: &mut TransitionCtx<'_>) {
        self.set_state(TransitionState::Active);
        let bar = self.roles.resolve("bar");
        self.progress_tween = ctx.engine.animate(bar, &self.script.progress);
    }

    fn read_progress(&mut self, frame: &MotionFrame) {
        let Some(handle) = self.progress_tween else {
            return;
        };
        for event in frame.events_for(handle.id) {
            let p = match event {
                MotionEvent::Update { progress, .. } => *progress * 100.0,
                MotionEvent::Completed { .. } => 100.0,
                _ => continue,
            };
            self.progress = self.progress.max(p.clamp(0.0, 100.0));
        }
    }

    fn finish_progress(&mut self, ctx: &mut TransitionCtx<'_>) {
        if let Some(handle) = self.progress_tween.take() {
            ctx.engine.cancel(handle);
        }
        self.progress = 100.0;
        for target in self.roles.resolve("bar").iter() {
            ctx.stage.write(target, "progress", Value::Float(100.0));
        }
    }

    fn enter_exiting(&mut self, ctx: &mut TransitionCtx<'_>) {
        self.set_state(TransitionState::Exiting);
        let exit = self.script.exit.clone();
        self.play_phase(&exit, ctx);
        if self.script.burst_count > 0 {
            ctx.particles.spawn(
                ctx.engine,
                ctx.stage,
                self.region,
                self.script.burst_count,
                &self.script.burst,
            );
        }
    }

    fn enter_removed(&mut self, ctx: &mut TransitionCtx<'_>) {
        self.set_state(TransitionState::Removed);
        if let Some(run) = self.run.as_mut() {
            run.cancel(ctx.engine);
        }
        if let Some(handle) = self.progress_tween.take() {
            ctx.engine.cancel(handle);
        }
        ctx.particles.teardown(self.region, ctx.engine, ctx.stage);
        ctx.stage.remove(self.region);
        info!(region = ?self.region, "loader removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_motion_core::{HeadlessStage, MotionConfig, Unavailable};

    const DT: f64 = 1000.0 / 60.0;

    struct Rig {
        engine: MotionEngine,
        particles: ParticleManager,
        stage: HeadlessStage,
    }

    impl Rig {
        fn new(engine: MotionEngine) -> Self {
            let particles = ParticleManager::for_engine(&engine);
            Self {
                engine,
                particles,
                stage: HeadlessStage::new(),
            }
        }

        fn mount(&mut self) -> LoaderTransition {
            let region = self.stage.create_root("loader");
            let logo = self.stage.create_child(region, "logo").unwrap();
            let bar = self.stage.create_child(region, "bar").unwrap();
            let roles = Roles::new().with("logo", logo).with("bar", bar);
            let mut ctx = TransitionCtx {
                engine: &mut self.engine,
                particles: &mut self.particles,
                stage: &mut self.stage,
            };
            LoaderTransition::mount(region, roles, LoaderScript::default(), &mut ctx)
        }

        fn step(&mut self, t: &mut LoaderTransition, signals: LoadingSignals) -> Option<TransitionState> {
            let frame = self.engine.tick(DT, &mut self.stage);
            let mut ctx = TransitionCtx {
                engine: &mut self.engine,
                particles: &mut self.particles,
                stage: &mut self.stage,
            };
            let changed = t.tick(DT, signals, &frame, &mut ctx);
            self.particles.update(DT, &mut self.engine, &mut self.stage);
            changed
        }
    }

    #[test]
    fn full_sequence_with_monotonic_progress() {
        let mut rig = Rig::new(MotionEngine::ready(MotionConfig::default().with_seed(5)));
        let mut t = rig.mount();
        let region = t.region();
        let mut last = 0.0;
        for i in 0..600 {
            let signals = if i < 120 {
                LoadingSignals::loading()
            } else {
                LoadingSignals::done()
            };
            rig.step(&mut t, signals);
            assert!(t.progress() >= last);
            last = t.progress();
            if t.is_removed() {
                break;
            }
        }
        assert_eq!(
            t.history(),
            &[
                TransitionState::Entering,
                TransitionState::Active,
                TransitionState::Exiting,
                TransitionState::Removed
            ]
        );
        assert_eq!(t.progress(), 100.0);
        assert!(!rig.stage.contains(region));
        assert_eq!(rig.particles.live_count(region), 0);
    }

    #[test]
    fn one_state_change_per_tick() {
        let mut rig = Rig::new(MotionEngine::new(
            MotionConfig::default(),
            Unavailable::new("no primitive"),
        ));
        let mut t = rig.mount();
        assert_eq!(rig.step(&mut t, LoadingSignals::done()), Some(TransitionState::Active));
        // progress snaps to 100 on this tick; exit waits for the next
        assert_eq!(rig.step(&mut t, LoadingSignals::done()), None);
        assert_eq!(t.progress(), 100.0);
        assert_eq!(rig.step(&mut t, LoadingSignals::done()), Some(TransitionState::Exiting));
        assert_eq!(rig.step(&mut t, LoadingSignals::done()), Some(TransitionState::Removed));
        assert_eq!(rig.step(&mut t, LoadingSignals::loading()), None);
        assert_eq!(t.history().len(), 4);
    }

    #[test]
    fn stays_active_while_loading() {
        let mut rig = Rig::new(MotionEngine::ready(MotionConfig::default()));
        let mut t = rig.mount();
        for _ in 0..400 {
            rig.step(&mut t, LoadingSignals::loading());
        }
        assert_eq!(t.state(), TransitionState::Active);
        assert!(t.progress() <= 100.0);
    }

    #[test]
    fn withdraw_skips_exit() {
        let mut rig = Rig::new(MotionEngine::ready(MotionConfig::default()));
        let mut t = rig.mount();
        let region = t.region();
        let mut ctx = TransitionCtx {
            engine: &mut rig.engine,
            particles: &mut rig.particles,
            stage: &mut rig.stage,
        };
        t.withdraw(&mut ctx);
        assert!(t.is_removed());
        assert!(!rig.stage.contains(region));
        assert_eq!(t.history(), &[TransitionState::Entering, TransitionState::Removed]);
    }
}
