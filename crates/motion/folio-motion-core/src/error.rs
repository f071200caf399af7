//! Error types for the motion layer.
//!
//! None of these reach the host through `animate`/`timeline`: the facade logs
//! them and hands back `None`. They surface only from setup paths such as
//! config parsing and position tags.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionError {
    /// The tweening primitive has not finished loading (or failed to load).
    #[error("motion engine not ready")]
    EngineNotReady,

    /// A tween or timeline could not be built from the given spec.
    #[error("construction error: {reason}")]
    Construction { reason: String },

    /// The host has no visibility observer.
    #[error("visibility observer unavailable")]
    ObserverUnavailable,

    /// A timeline position tag could not be parsed.
    #[error("invalid timeline position: {tag:?}")]
    InvalidPosition { tag: String },

    /// Easing name not recognised.
    #[error("unknown easing: {name}")]
    UnknownEasing { name: String },

    /// Configuration failed validation.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl MotionError {
    pub fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }

    /// Degraded-but-running errors: the caller gets a fallback and carries on.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EngineNotReady
                | Self::Construction { .. }
                | Self::ObserverUnavailable
                | Self::InvalidPosition { .. }
                | Self::UnknownEasing { .. }
        )
    }

    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::EngineNotReady => "engine",
            Self::Construction { .. } => "construction",
            Self::ObserverUnavailable => "observer",
            Self::InvalidPosition { .. } | Self::UnknownEasing { .. } => "parse",
            Self::InvalidConfig { .. } => "config",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = core::result::Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability() {
        assert!(MotionError::EngineNotReady.is_recoverable());
        assert!(MotionError::construction("bad").is_recoverable());
        assert!(!MotionError::InvalidConfig {
            reason: "x".into()
        }
        .is_recoverable());
    }

    #[test]
    fn categories() {
        assert_eq!(MotionError::ObserverUnavailable.category(), "observer");
        assert_eq!(
            MotionError::InvalidPosition { tag: "?".into() }.category(),
            "parse"
        );
    }

    #[test]
    fn from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: MotionError = err.into();
        assert_eq!(e.category(), "serialization");
    }
}
