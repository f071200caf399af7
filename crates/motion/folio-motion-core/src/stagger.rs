//! Per-index delays for cascading effects.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Where the cascade originates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerFrom {
    #[default]
    First,
    Last,
    Center,
    Index(usize),
}

/// Stagger step: a fixed increment per index, or a range spread across all targets.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaggerValue {
    Step(f64),
    Range([f64; 2]),
}

impl From<f64> for StaggerValue {
    fn from(v: f64) -> Self {
        StaggerValue::Step(v)
    }
}

impl From<[f64; 2]> for StaggerValue {
    fn from(v: [f64; 2]) -> Self {
        StaggerValue::Range(v)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerOptions {
    /// Constant added to every delay.
    pub start: f64,
    pub from: StaggerFrom,
    pub reverse: bool,
    pub easing: Option<Easing>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stagger {
    pub value: StaggerValue,
    #[serde(flatten)]
    pub options: StaggerOptions,
}

impl Stagger {
    pub fn new(value: impl Into<StaggerValue>, options: StaggerOptions) -> Self {
        Self {
            value: value.into(),
            options,
        }
    }

    /// The no-op stagger handed out while the engine is not ready.
    pub fn zero() -> Self {
        Self::new(0.0, StaggerOptions::default())
    }

    /// Delay in ms for target `index` out of `count`. Delays follow enumeration
    /// order of the targets.
    pub fn delay(&self, index: usize, count: usize) -> f64 {
        let count = count.max(1);
        let index = index.min(count - 1);
        let origin = match self.options.from {
            StaggerFrom::First => 0.0,
            StaggerFrom::Last => (count - 1) as f64,
            StaggerFrom::Center => (count - 1) as f64 / 2.0,
            StaggerFrom::Index(i) => i.min(count - 1) as f64,
        };
        let max_distance = (0..count)
            .map(|i| (origin - i as f64).abs())
            .fold(0.0, f64::max);
        let mut distance = (origin - index as f64).abs();
        if self.options.reverse {
            distance = (max_distance - distance).abs();
        }
        if let Some(easing) = self.options.easing {
            if max_distance > 0.0 {
                distance = easing.evaluate((distance / max_distance) as f32) as f64 * max_distance;
            }
        }
        let offset = match self.value {
            StaggerValue::Step(step) => step * distance,
            StaggerValue::Range([a, b]) => {
                if max_distance > 0.0 {
                    a + (b - a) * distance / max_distance
                } else {
                    a
                }
            }
        };
        self.options.start + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_from_first_is_linear_in_index() {
        let s = Stagger::new(100.0, StaggerOptions::default());
        let d: Vec<f64> = (0..4).map(|i| s.delay(i, 4)).collect();
        assert_eq!(d, vec![0.0, 100.0, 200.0, 300.0]);
    }

    #[test]
    fn center_origin_is_symmetric() {
        let s = Stagger::new(
            50.0,
            StaggerOptions {
                from: StaggerFrom::Center,
                ..Default::default()
            },
        );
        assert_eq!(s.delay(0, 5), s.delay(4, 5));
        assert_eq!(s.delay(2, 5), 0.0);
    }

    #[test]
    fn range_spreads_between_bounds() {
        let s = Stagger::new([200.0, 800.0], StaggerOptions::default());
        assert_eq!(s.delay(0, 4), 200.0);
        assert_eq!(s.delay(3, 4), 800.0);
    }

    #[test]
    fn reverse_and_start() {
        let s = Stagger::new(
            10.0,
            StaggerOptions {
                start: 500.0,
                reverse: true,
                ..Default::default()
            },
        );
        assert_eq!(s.delay(0, 3), 520.0);
        assert_eq!(s.delay(2, 3), 500.0);
    }

    #[test]
    fn zero_is_zero() {
        assert_eq!(Stagger::zero().delay(7, 10), 0.0);
    }
}
