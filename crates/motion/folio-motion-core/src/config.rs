//! Configuration for the motion layer.
//!
//! Recognised options (JSON, camelCase): `particleCount`, `morphingShapes`,
//! `interactive`, `speed`, plus `seed` and `frameIntervalMs`.

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};

/// Global pace. Multiplies every declared duration, delay and offset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    #[inline]
    pub fn multiplier(self) -> f64 {
        match self {
            Speed::Slow => 1.5,
            Speed::Normal => 1.0,
            Speed::Fast => 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionConfig {
    /// Maximum live particles per container.
    pub particle_count: usize,
    /// Enables the periodic shape-morph loop.
    pub morphing_shapes: bool,
    /// Enables pointer-driven ripple spawning.
    pub interactive: bool,
    pub speed: Speed,
    /// Seed for random draws; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Frame interval in ms. Also the timing tolerance for offsets and lifetimes.
    pub frame_interval_ms: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            particle_count: 30,
            morphing_shapes: false,
            interactive: false,
            speed: Speed::Normal,
            seed: None,
            frame_interval_ms: 1000.0 / 60.0,
        }
    }
}

impl MotionConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: MotionConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.frame_interval_ms.is_finite() && self.frame_interval_ms > 0.0) {
            return Err(MotionError::InvalidConfig {
                reason: "frameIntervalMs must be positive and finite".to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    #[inline]
    pub fn with_morphing_shapes(mut self, enabled: bool) -> Self {
        self.morphing_shapes = enabled;
        self
    }

    #[inline]
    pub fn with_interactive(mut self, enabled: bool) -> Self {
        self.interactive = enabled;
        self
    }

    #[inline]
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Scale a declared duration by the configured speed.
    #[inline]
    pub fn scale(&self, ms: f64) -> f64 {
        ms * self.speed.multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = MotionConfig::default();
        assert_eq!(cfg.particle_count, 30);
        assert_eq!(cfg.speed, Speed::Normal);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn json_options_table() {
        let cfg = MotionConfig::from_json(
            r#"{"particleCount": 12, "morphingShapes": true, "interactive": true, "speed": "slow"}"#,
        )
        .unwrap();
        assert_eq!(cfg.particle_count, 12);
        assert!(cfg.morphing_shapes);
        assert!(cfg.interactive);
        assert_eq!(cfg.scale(1000.0), 1500.0);
    }

    #[test]
    fn speed_multipliers() {
        assert_eq!(Speed::Slow.multiplier(), 1.5);
        assert_eq!(Speed::Normal.multiplier(), 1.0);
        assert_eq!(Speed::Fast.multiplier(), 0.5);
    }

    #[test]
    fn rejects_bad_frame_interval() {
        assert!(MotionConfig::from_json(r#"{"frameIntervalMs": 0}"#).is_err());
        assert!(MotionConfig::from_json(r#"{"speed": "warp"}"#).is_err());
    }
}
