//! AnimationSpec: declarative description of one tween applied to a set of targets.
//!
//! JSON shape (durations in milliseconds):
//! ```json
//! {
//!   "properties": { "opacity": [0, 1], "translateY": {"min": -40, "max": 40} },
//!   "duration": 800,
//!   "easing": "easeOutExpo",
//!   "delay": { "value": 80, "from": "center" },
//!   "loop": true,
//!   "direction": "alternate"
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{MotionError, Result};
use crate::source::ValueSource;
use crate::stagger::{Stagger, StaggerOptions, StaggerValue};

fn default_duration() -> f64 {
    1000.0
}

/// One animated property. `from: None` starts from the target's current value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPropertyTween")]
pub struct PropertyTween {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ValueSource>,
    pub to: ValueSource,
}

impl PropertyTween {
    pub fn to(to: impl Into<ValueSource>) -> Self {
        Self {
            from: None,
            to: to.into(),
        }
    }

    pub fn from_to(from: impl Into<ValueSource>, to: impl Into<ValueSource>) -> Self {
        Self {
            from: Some(from.into()),
            to: to.into(),
        }
    }
}

/// Accepted JSON shapes: `{"from":..,"to":..}`, `[from, to]`, or a bare target value.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPropertyTween {
    Full {
        #[serde(default)]
        from: Option<ValueSource>,
        to: ValueSource,
    },
    Pair([ValueSource; 2]),
    To(ValueSource),
}

impl From<RawPropertyTween> for PropertyTween {
    fn from(raw: RawPropertyTween) -> Self {
        match raw {
            RawPropertyTween::Full { from, to } => Self { from, to },
            RawPropertyTween::Pair([from, to]) => Self {
                from: Some(from),
                to,
            },
            RawPropertyTween::To(to) => Self { from: None, to },
        }
    }
}

/// Delay before each target starts: constant, or staggered by target index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelayPolicy {
    Constant(f64),
    Stagger(Stagger),
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::Constant(0.0)
    }
}

impl DelayPolicy {
    #[inline]
    pub fn delay_for(&self, index: usize, count: usize) -> f64 {
        match self {
            DelayPolicy::Constant(ms) => *ms,
            DelayPolicy::Stagger(s) => s.delay(index, count),
        }
    }
}

/// How many times the tween plays. JSON: `true` (infinite), `false`, or a count.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLoop", into = "RawLoop")]
pub enum LoopPolicy {
    #[default]
    Once,
    Times(u32),
    Infinite,
}

impl LoopPolicy {
    /// `None` for infinite loops.
    #[inline]
    pub fn iterations(self) -> Option<u32> {
        match self {
            LoopPolicy::Once => Some(1),
            LoopPolicy::Times(n) => Some(n.max(1)),
            LoopPolicy::Infinite => None,
        }
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        matches!(self, LoopPolicy::Infinite)
    }
}

#[derive(Copy, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLoop {
    Flag(bool),
    Count(u32),
}

impl From<RawLoop> for LoopPolicy {
    fn from(raw: RawLoop) -> Self {
        match raw {
            RawLoop::Flag(true) => LoopPolicy::Infinite,
            RawLoop::Flag(false) | RawLoop::Count(0) | RawLoop::Count(1) => LoopPolicy::Once,
            RawLoop::Count(n) => LoopPolicy::Times(n),
        }
    }
}

impl From<LoopPolicy> for RawLoop {
    fn from(policy: LoopPolicy) -> Self {
        match policy {
            LoopPolicy::Once => RawLoop::Flag(false),
            LoopPolicy::Times(n) => RawLoop::Count(n),
            LoopPolicy::Infinite => RawLoop::Flag(true),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Normal,
    Reverse,
    /// Odd iterations play backwards.
    Alternate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Properties in application order.
    #[serde(default)]
    pub properties: IndexMap<String, PropertyTween>,
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub delay: DelayPolicy,
    /// Idle time after the last iteration before the tween counts as complete.
    #[serde(default)]
    pub end_delay: f64,
    #[serde(default, rename = "loop")]
    pub looping: LoopPolicy,
    #[serde(default)]
    pub direction: Direction,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            properties: IndexMap::new(),
            duration: default_duration(),
            easing: Easing::default(),
            delay: DelayPolicy::default(),
            end_delay: 0.0,
            looping: LoopPolicy::default(),
            direction: Direction::default(),
        }
    }
}

impl AnimationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prop(mut self, name: impl Into<String>, tween: PropertyTween) -> Self {
        self.properties.insert(name.into(), tween);
        self
    }

    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn delay(mut self, ms: f64) -> Self {
        self.delay = DelayPolicy::Constant(ms);
        self
    }

    pub fn stagger(mut self, value: impl Into<StaggerValue>, options: StaggerOptions) -> Self {
        self.delay = DelayPolicy::Stagger(Stagger::new(value, options));
        self
    }

    pub fn end_delay(mut self, ms: f64) -> Self {
        self.end_delay = ms;
        self
    }

    pub fn looping(mut self, policy: LoopPolicy) -> Self {
        self.looping = policy;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Declared span for `count` targets in unscaled ms: the latest target delay
    /// plus all iterations plus `end_delay`. Infinite loops count one iteration.
    pub fn span_ms(&self, count: usize) -> f64 {
        let count = count.max(1);
        let max_delay = (0..count)
            .map(|i| self.delay.delay_for(i, count))
            .fold(0.0, f64::max);
        let iterations = self.looping.iterations().unwrap_or(1) as f64;
        max_delay + self.duration * iterations + self.end_delay
    }

    /// Whether the last iteration finishes on `from` instead of `to`.
    /// Infinite loops are judged by their first iteration.
    pub fn ends_at_start(&self) -> bool {
        match self.direction {
            Direction::Normal => false,
            Direction::Reverse => true,
            Direction::Alternate => matches!(self.looping.iterations(), Some(n) if n % 2 == 0),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let finite_non_negative = |label: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(MotionError::construction(format!("{label} must be finite and >= 0, got {v}")))
            }
        };
        finite_non_negative("duration", self.duration)?;
        finite_non_negative("end_delay", self.end_delay)?;
        match &self.delay {
            DelayPolicy::Constant(ms) => finite_non_negative("delay", *ms)?,
            DelayPolicy::Stagger(s) => {
                finite_non_negative("stagger start", s.options.start)?;
                match s.value {
                    StaggerValue::Step(v) => finite_non_negative("stagger", v)?,
                    StaggerValue::Range([a, b]) => {
                        finite_non_negative("stagger range start", a)?;
                        finite_non_negative("stagger range end", b)?;
                    }
                }
            }
        }
        for (name, tween) in &self.properties {
            if name.is_empty() {
                return Err(MotionError::construction("empty property name"));
            }
            if let Some(from) = &tween.from {
                from.validate()?;
            }
            tween.to.validate()?;
        }
        Ok(())
    }
}
