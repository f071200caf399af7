//! The tweening primitive: interpolates resolved property values over time.
//!
//! [`TweenPrimitive`] is the seam the engine loads lazily; [`Tweener`] is the
//! in-crate implementation. Requests arrive fully resolved (random sources
//! already drawn, speed already applied), so a primitive only deals with time.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::easing::Easing;
use crate::error::{MotionError, Result};
use crate::events::MotionEvent;
use crate::ids::{ElementId, IdAllocator, TweenId};
use crate::source::RandomSource;
use crate::spec::{Direction, LoopPolicy};
use crate::stage::Stage;
use crate::stagger::{Stagger, StaggerOptions, StaggerValue};
use crate::value::Value;

/// Resolved per-target work: delay plus `(property, from, to)` triples.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackRequest {
    pub target: ElementId,
    pub delay_ms: f64,
    pub properties: Vec<(String, Option<Value>, Value)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TweenRequest {
    pub tracks: Vec<TrackRequest>,
    pub duration_ms: f64,
    pub end_delay_ms: f64,
    pub easing: Easing,
    pub looping: LoopPolicy,
    pub direction: Direction,
}

impl TweenRequest {
    /// Total time to completion; `None` for infinite loops.
    pub fn span_ms(&self) -> Option<f64> {
        let max_delay = self
            .tracks
            .iter()
            .map(|t| t.delay_ms)
            .fold(0.0, f64::max);
        self.looping
            .iterations()
            .map(|n| max_delay + self.duration_ms * n as f64 + self.end_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if !(self.duration_ms.is_finite() && self.duration_ms >= 0.0) {
            return Err(MotionError::construction(format!(
                "invalid duration {}",
                self.duration_ms
            )));
        }
        if !(self.end_delay_ms.is_finite() && self.end_delay_ms >= 0.0) {
            return Err(MotionError::construction("invalid end delay"));
        }
        if self.looping.is_infinite() && self.duration_ms <= 0.0 {
            return Err(MotionError::construction(
                "infinite loop needs a positive duration",
            ));
        }
        for track in &self.tracks {
            if !(track.delay_ms.is_finite() && track.delay_ms >= 0.0) {
                return Err(MotionError::construction(format!(
                    "invalid delay {} for {:?}",
                    track.delay_ms, track.target
                )));
            }
            for (name, from, to) in &track.properties {
                let bad = |v: &Value| matches!(v, Value::Float(f) if !f.is_finite());
                if bad(to) || from.as_ref().is_some_and(bad) {
                    return Err(MotionError::construction(format!(
                        "non-finite value for {name}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Capability the engine facade drives once loaded.
pub trait TweenPrimitive: fmt::Debug {
    fn animate(&mut self, request: TweenRequest) -> Result<TweenId>;
    /// Freeze a tween in place. Returns false for unknown or finished tweens.
    fn pause(&mut self, id: TweenId) -> bool;
    /// Drop a tween for good. `Cancelled` is reported on the next tick.
    fn cancel(&mut self, id: TweenId) -> bool;
    fn play(&mut self, id: TweenId) -> bool;
    fn is_finished(&self, id: TweenId) -> bool;
    fn active_count(&self) -> usize;
    /// Advance every running tween by `dt_ms` and write values into `stage`.
    fn tick(&mut self, dt_ms: f64, stage: &mut dyn Stage, events: &mut Vec<MotionEvent>);
    fn random(&mut self, min: f64, max: f64) -> f64;

    fn stagger(&self, value: StaggerValue, options: StaggerOptions) -> Stagger {
        Stagger::new(value, options)
    }

    fn easing(&self, name: &str, args: &[f32]) -> Result<Easing> {
        Easing::from_name(name, args)
    }
}

#[derive(Copy, Clone, Debug)]
struct Timing {
    duration: f64,
    iterations: Option<u32>,
    direction: Direction,
    easing: Easing,
}

impl Timing {
    /// (iteration index, linear progress within it) at local time `local >= 0`.
    fn position(&self, local: f64) -> (u32, f64) {
        if self.duration <= 0.0 {
            return (self.iterations.unwrap_or(1).saturating_sub(1), 1.0);
        }
        let raw = (local / self.duration).floor();
        match self.iterations {
            Some(n) if raw >= n as f64 => (n - 1, 1.0),
            _ => (raw as u32, (local - raw * self.duration) / self.duration),
        }
    }

    fn finished_at(&self, local: f64) -> bool {
        match self.iterations {
            Some(n) => local >= self.duration * n as f64,
            None => false,
        }
    }

    fn directed(&self, iteration: u32, t: f64) -> f64 {
        match self.direction {
            Direction::Normal => t,
            Direction::Reverse => 1.0 - t,
            Direction::Alternate if iteration % 2 == 1 => 1.0 - t,
            Direction::Alternate => t,
        }
    }
}

#[derive(Debug)]
struct PropState {
    name: String,
    from: Option<Value>,
    to: Value,
}

#[derive(Debug)]
struct TrackState {
    target: ElementId,
    delay: f64,
    props: Vec<PropState>,
    started: bool,
    finished: bool,
}

impl TrackState {
    fn apply(&mut self, elapsed: f64, timing: &Timing, stage: &mut dyn Stage) {
        if self.finished {
            return;
        }
        let local = elapsed - self.delay;
        if local < 0.0 {
            return;
        }
        if !self.started {
            for p in &mut self.props {
                if p.from.is_none() {
                    p.from = Some(
                        stage
                            .read(self.target, &p.name)
                            .unwrap_or_else(|| Value::zero_like(&p.to)),
                    );
                }
            }
            self.started = true;
        }
        let (iteration, t) = timing.position(local);
        let eased = timing.easing.evaluate(timing.directed(iteration, t) as f32);
        for p in &self.props {
            if let Some(from) = &p.from {
                stage.write(self.target, &p.name, Value::lerp(from, &p.to, eased));
            }
        }
        self.finished = timing.finished_at(local);
    }
}

enum Status {
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug)]
struct ActiveTween {
    id: TweenId,
    tracks: Vec<TrackState>,
    had_targets: bool,
    timing: Timing,
    span: Option<f64>,
    first_delay: f64,
    elapsed: f64,
    paused: bool,
    began: bool,
    loops_done: u32,
}

impl ActiveTween {
    fn advance(&mut self, dt: f64, stage: &mut dyn Stage, events: &mut Vec<MotionEvent>) -> Status {
        // Targets are weak: forget any the host has unmounted, paused or not.
        self.tracks.retain(|t| stage.contains(t.target));
        if self.had_targets && self.tracks.is_empty() {
            return Status::Cancelled;
        }
        if self.paused {
            return Status::Running;
        }
        self.elapsed += dt;
        if !self.began {
            self.began = true;
            events.push(MotionEvent::Began { tween: self.id });
        }

        let timing = self.timing;
        for track in &mut self.tracks {
            track.apply(self.elapsed, &timing, stage);
        }

        let local = (self.elapsed - self.first_delay).max(0.0);
        let duration = timing.duration;
        if duration > 0.0 {
            let mut loops = (local / duration).floor() as u32;
            if let Some(n) = timing.iterations {
                loops = loops.min(n);
            }
            while self.loops_done < loops {
                self.loops_done += 1;
                events.push(MotionEvent::LoopCompleted {
                    tween: self.id,
                    iteration: self.loops_done,
                });
            }
        }

        let progress = match self.span {
            Some(total) if total <= 0.0 => 1.0,
            Some(total) => (self.elapsed / total).min(1.0),
            None if duration > 0.0 => (local % duration) / duration,
            None => 1.0,
        };
        events.push(MotionEvent::Update {
            tween: self.id,
            progress: progress as f32,
        });

        match self.span {
            Some(total) if self.elapsed >= total => Status::Completed,
            _ => Status::Running,
        }
    }
}

/// Default in-process tweening primitive.
#[derive(Debug)]
pub struct Tweener {
    ids: IdAllocator,
    tweens: Vec<ActiveTween>,
    /// Events raised outside `tick`, flushed at the start of the next one.
    pending: Vec<MotionEvent>,
    rng: StdRng,
}

impl Tweener {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            ids: IdAllocator::new(),
            tweens: Vec::new(),
            pending: Vec::new(),
            rng: seed
                .map(StdRng::seed_from_u64)
                .unwrap_or_else(StdRng::from_entropy),
        }
    }

    fn find_mut(&mut self, id: TweenId) -> Option<&mut ActiveTween> {
        self.tweens.iter_mut().find(|t| t.id == id)
    }
}

impl Default for Tweener {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TweenPrimitive for Tweener {
    fn animate(&mut self, request: TweenRequest) -> Result<TweenId> {
        request.validate()?;
        let id = self.ids.alloc_tween();
        let span = request.span_ms();
        let first_delay = request
            .tracks
            .iter()
            .map(|t| t.delay_ms)
            .fold(f64::INFINITY, f64::min);
        let tracks: Vec<TrackState> = request
            .tracks
            .into_iter()
            .map(|t| TrackState {
                target: t.target,
                delay: t.delay_ms,
                props: t
                    .properties
                    .into_iter()
                    .map(|(name, from, to)| PropState { name, from, to })
                    .collect(),
                started: false,
                finished: false,
            })
            .collect();
        debug!(tween = id.0, targets = tracks.len(), ?span, "tween created");
        self.tweens.push(ActiveTween {
            id,
            had_targets: !tracks.is_empty(),
            tracks,
            timing: Timing {
                duration: request.duration_ms,
                iterations: request.looping.iterations(),
                direction: request.direction,
                easing: request.easing,
            },
            span,
            first_delay: if first_delay.is_finite() { first_delay } else { 0.0 },
            elapsed: 0.0,
            paused: false,
            began: false,
            loops_done: 0,
        });
        Ok(id)
    }

    fn pause(&mut self, id: TweenId) -> bool {
        match self.find_mut(id) {
            Some(t) => {
                t.paused = true;
                true
            }
            None => false,
        }
    }

    fn cancel(&mut self, id: TweenId) -> bool {
        let Some(index) = self.tweens.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tweens.swap_remove(index);
        debug!(tween = id.0, "tween cancelled");
        self.pending.push(MotionEvent::Cancelled { tween: id });
        true
    }

    fn play(&mut self, id: TweenId) -> bool {
        match self.find_mut(id) {
            Some(t) => {
                t.paused = false;
                true
            }
            None => false,
        }
    }

    fn is_finished(&self, id: TweenId) -> bool {
        self.ids.issued(id) && !self.tweens.iter().any(|t| t.id == id)
    }

    fn active_count(&self) -> usize {
        self.tweens.len()
    }

    fn tick(&mut self, dt_ms: f64, stage: &mut dyn Stage, events: &mut Vec<MotionEvent>) {
        events.append(&mut self.pending);
        self.tweens.retain_mut(|tween| match tween.advance(dt_ms, stage, events) {
            Status::Running => true,
            Status::Completed => {
                events.push(MotionEvent::Completed { tween: tween.id });
                false
            }
            Status::Cancelled => {
                debug!(tween = tween.id.0, "all targets gone; tween cancelled");
                events.push(MotionEvent::Cancelled { tween: tween.id });
                false
            }
        });
    }

    fn random(&mut self, min: f64, max: f64) -> f64 {
        self.rng.uniform(min, max)
    }
}
