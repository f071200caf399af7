//! ValueSource: a property value that is either fixed or drawn per target.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::value::Value;

/// Anything that can hand out uniform draws in `[min, max)`.
pub trait RandomSource {
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

impl RandomSource for StdRng {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.gen::<f64>()
    }
}

/// Constant value or bounded random draw.
///
/// JSON: a bare number or string is a constant; `{"min": a, "max": b}` is random.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ValueSource {
    Constant(Value),
    BoundedRandom { min: f32, max: f32 },
}

impl ValueSource {
    pub fn random(min: f32, max: f32) -> Self {
        Self::BoundedRandom { min, max }
    }

    /// Evaluate once. Callers invoke this per target so every target gets its
    /// own draw.
    pub fn evaluate(&self, rng: &mut dyn RandomSource) -> Value {
        match self {
            ValueSource::Constant(v) => v.clone(),
            ValueSource::BoundedRandom { min, max } => {
                Value::Float(rng.uniform(*min as f64, *max as f64) as f32)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ValueSource::Constant(Value::Float(f)) if !f.is_finite() => {
                Err(MotionError::construction(format!("non-finite constant {f}")))
            }
            ValueSource::BoundedRandom { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    Err(MotionError::construction("non-finite random bound"))
                } else if min > max {
                    Err(MotionError::construction(format!(
                        "random range min {min} > max {max}"
                    )))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

impl From<Value> for ValueSource {
    fn from(v: Value) -> Self {
        ValueSource::Constant(v)
    }
}

impl From<f32> for ValueSource {
    fn from(v: f32) -> Self {
        ValueSource::Constant(Value::Float(v))
    }
}

impl From<f64> for ValueSource {
    fn from(v: f64) -> Self {
        ValueSource::Constant(Value::Float(v as f32))
    }
}

impl From<&str> for ValueSource {
    fn from(v: &str) -> Self {
        ValueSource::Constant(Value::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn constant_is_stable() {
        let mut rng = StdRng::seed_from_u64(1);
        let src = ValueSource::from(0.5);
        assert_eq!(src.evaluate(&mut rng), Value::Float(0.5));
        assert_eq!(src.evaluate(&mut rng), Value::Float(0.5));
    }

    #[test]
    fn random_stays_in_bounds_and_varies() {
        let mut rng = StdRng::seed_from_u64(7);
        let src = ValueSource::random(-50.0, 50.0);
        let draws: Vec<f32> = (0..32)
            .map(|_| src.evaluate(&mut rng).as_float().unwrap())
            .collect();
        assert!(draws.iter().all(|d| (-50.0..50.0).contains(d)));
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn degenerate_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            ValueSource::random(3.0, 3.0).evaluate(&mut rng),
            Value::Float(3.0)
        );
    }

    #[test]
    fn inverted_range_fails_validation() {
        assert!(ValueSource::random(2.0, 1.0).validate().is_err());
        assert!(ValueSource::random(1.0, 2.0).validate().is_ok());
    }

    #[test]
    fn json_forms() {
        let c: ValueSource = serde_json::from_str("1").unwrap();
        assert_eq!(c, ValueSource::Constant(Value::Float(1.0)));
        let r: ValueSource = serde_json::from_str(r#"{"min": 0, "max": 2}"#).unwrap();
        assert_eq!(r, ValueSource::random(0.0, 2.0));
    }
}
