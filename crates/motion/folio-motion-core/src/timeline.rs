//! Timeline: ordered steps with relative offsets.
//!
//! Steps are placed relative to the end of the previous step:
//! - no tag: right after it
//! - `"+=N"`: N ms after it ends
//! - `"-=N"`: N ms before it ends (steps overlap)
//! - `"N"`: absolute N ms from the timeline start
//!
//! Placement is computed up front ([`Timeline::schedule`]); playing a timeline
//! starts one tween per step with the step's start as an offset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{AnimationHandle, MotionEngine};
use crate::error::{MotionError, Result};
use crate::spec::AnimationSpec;
use crate::stage::Targets;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    #[default]
    AfterPrevious,
    After(f64),
    Overlap(f64),
    Absolute(f64),
}

impl Position {
    /// Parse a tag, logging and falling back to [`Position::AfterPrevious`] on error.
    pub fn parse_lenient(tag: Option<&str>) -> Position {
        match tag {
            None => Position::AfterPrevious,
            Some(tag) => tag.parse().unwrap_or_else(|err: MotionError| {
                warn!(error = %err, "ignoring timeline position");
                Position::AfterPrevious
            }),
        }
    }

    fn start_after(self, previous_end: f64, speed: f64) -> f64 {
        match self {
            Position::AfterPrevious => previous_end,
            Position::After(ms) => previous_end + ms * speed,
            Position::Overlap(ms) => (previous_end - ms * speed).max(0.0),
            Position::Absolute(ms) => ms * speed,
        }
    }
}

impl FromStr for Position {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MotionError::InvalidPosition { tag: s.to_string() };
        let tag = s.trim();
        if tag.is_empty() {
            return Ok(Position::AfterPrevious);
        }
        let (ctor, rest): (fn(f64) -> Position, &str) = if let Some(rest) = tag.strip_prefix("+=") {
            (Position::After, rest)
        } else if let Some(rest) = tag.strip_prefix("-=") {
            (Position::Overlap, rest)
        } else {
            (Position::Absolute, tag)
        };
        let number = rest.trim().strip_suffix("ms").unwrap_or(rest.trim());
        let ms: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(invalid());
        }
        Ok(ctor(ms))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::AfterPrevious => Ok(()),
            Position::After(ms) => write!(f, "+={ms}"),
            Position::Overlap(ms) => write!(f, "-={ms}"),
            Position::Absolute(ms) => write!(f, "{ms}"),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = MotionError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineStep {
    pub targets: Targets,
    pub spec: AnimationSpec,
    pub position: Position,
}

/// Where a step landed, in speed-scaled ms from the timeline start.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledStep {
    pub index: usize,
    pub start_ms: f64,
    pub end_ms: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum PlayState {
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Clone, Debug, Default)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
    handles: Vec<AnimationHandle>,
    state: PlayState,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Chainable; an unparsable `position` is logged and treated
    /// as "after previous".
    pub fn add(
        mut self,
        targets: impl Into<Targets>,
        spec: AnimationSpec,
        position: Option<&str>,
    ) -> Self {
        self.push(targets.into(), spec, Position::parse_lenient(position));
        self
    }

    pub fn push(&mut self, targets: Targets, spec: AnimationSpec, position: Position) {
        self.steps.push(TimelineStep {
            targets,
            spec,
            position,
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn handles(&self) -> &[AnimationHandle] {
        &self.handles
    }

    /// Step placement for a given speed multiplier. Pure; does not need an engine.
    pub fn schedule(&self, speed: f64) -> Vec<ScheduledStep> {
        let mut previous_end = 0.0;
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let start_ms = step.position.start_after(previous_end, speed);
                let end_ms = start_ms + step.spec.span_ms(step.targets.len()) * speed;
                previous_end = end_ms;
                ScheduledStep {
                    index,
                    start_ms,
                    end_ms,
                }
            })
            .collect()
    }

    /// Time until the last step ends.
    pub fn duration_ms(&self, speed: f64) -> f64 {
        self.schedule(speed)
            .iter()
            .map(|s| s.end_ms)
            .fold(0.0, f64::max)
    }

    /// Start (or resume) the timeline. Returns whether it is now playing.
    pub fn play(&mut self, engine: &mut MotionEngine) -> bool {
        match self.state {
            PlayState::Playing => true,
            PlayState::Paused => {
                for h in &self.handles {
                    engine.play(*h);
                }
                self.state = PlayState::Playing;
                true
            }
            PlayState::Idle => {
                if !engine.is_ready() {
                    debug!("timeline not started: motion engine not ready");
                    return false;
                }
                let schedule = self.schedule(engine.speed_factor());
                for (step, slot) in self.steps.iter().zip(&schedule) {
                    if let Some(h) = engine.animate_at(&step.targets, &step.spec, slot.start_ms) {
                        self.handles.push(h);
                    }
                }
                debug!(
                    steps = self.steps.len(),
                    started = self.handles.len(),
                    "timeline playing"
                );
                self.state = PlayState::Playing;
                true
            }
        }
    }

    /// Freeze every step. Safe before `play`, mid-run, or after completion.
    pub fn pause(&mut self, engine: &mut MotionEngine) {
        if self.state == PlayState::Playing {
            for h in &self.handles {
                engine.pause(*h);
            }
            self.state = PlayState::Paused;
        }
    }

    /// Release every started step. Afterwards the timeline reports finished
    /// and `play` has nothing left to resume.
    pub fn cancel(&mut self, engine: &mut MotionEngine) {
        for h in self.handles.drain(..) {
            engine.cancel(h);
        }
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Played and every started step has completed or been cancelled.
    pub fn is_finished(&self, engine: &MotionEngine) -> bool {
        self.state != PlayState::Idle && self.handles.iter().all(|h| engine.is_finished(*h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::PropertyTween;

    fn step(duration: f64) -> AnimationSpec {
        AnimationSpec::new()
            .prop("opacity", PropertyTween::from_to(0.0, 1.0))
            .duration(duration)
    }

    #[test]
    fn parses_tags() {
        assert_eq!("+=300".parse::<Position>().unwrap(), Position::After(300.0));
        assert_eq!("-=400ms".parse::<Position>().unwrap(), Position::Overlap(400.0));
        assert_eq!("250".parse::<Position>().unwrap(), Position::Absolute(250.0));
        assert_eq!("".parse::<Position>().unwrap(), Position::AfterPrevious);
        assert!("-=soon".parse::<Position>().is_err());
        assert!("--5".parse::<Position>().is_err());
    }

    #[test]
    fn lenient_parse_falls_back() {
        assert_eq!(Position::parse_lenient(Some("later")), Position::AfterPrevious);
        assert_eq!(Position::parse_lenient(None), Position::AfterPrevious);
    }

    #[test]
    fn overlap_starts_before_previous_end() {
        let tl = Timeline::new()
            .add(crate::ids::ElementId(0), step(1000.0), None)
            .add(crate::ids::ElementId(1), step(500.0), Some("-=400"))
            .add(crate::ids::ElementId(2), step(200.0), Some("+=100"));
        let s = tl.schedule(1.0);
        assert_eq!(s[0].start_ms, 0.0);
        assert_eq!(s[1].start_ms, 600.0);
        assert_eq!(s[1].end_ms, 1100.0);
        assert_eq!(s[2].start_ms, 1200.0);
        assert_eq!(tl.duration_ms(1.0), 1400.0);
        assert_eq!(tl.duration_ms(1.5), 2100.0);
    }

    #[test]
    fn overlap_clamps_at_zero() {
        let tl = Timeline::new()
            .add(crate::ids::ElementId(0), step(100.0), None)
            .add(crate::ids::ElementId(1), step(100.0), Some("-=500"));
        assert_eq!(tl.schedule(1.0)[1].start_ms, 0.0);
    }

    #[test]
    fn position_serde() {
        let p: Position = serde_json::from_str("\"-=120\"").unwrap();
        assert_eq!(p, Position::Overlap(120.0));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"-=120\"");
    }
}
