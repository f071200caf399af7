//! Folio Motion Core (renderer-agnostic)
//!
//! Tweening and sequencing for the folio site. Hosts drive everything through a
//! [`MotionEngine`]: it lazily acquires a [`TweenPrimitive`] from an injected
//! [`PrimitiveLoader`], degrades to safe defaults until the primitive is ready,
//! and writes property values into a host-provided [`Stage`] once per frame.

pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod loader;
pub mod primitive;
pub mod source;
pub mod spec;
pub mod stage;
pub mod stagger;
pub mod timeline;
pub mod value;

// Re-exports for consumers (orchestrator, hosts)
pub use config::{MotionConfig, Speed};
pub use easing::Easing;
pub use engine::{AnimationHandle, Diagnostics, MotionEngine};
pub use error::{MotionError, Result};
pub use events::{MotionEvent, MotionFrame};
pub use ids::{ElementId, TweenId};
pub use loader::{LoadPoll, PrimitiveLoader, ReadyAfter, Unavailable};
pub use primitive::{TrackRequest, TweenPrimitive, TweenRequest, Tweener};
pub use source::{RandomSource, ValueSource};
pub use spec::{AnimationSpec, DelayPolicy, Direction, LoopPolicy, PropertyTween};
pub use stage::{HeadlessStage, Stage, Targets};
pub use stagger::{Stagger, StaggerFrom, StaggerOptions};
pub use timeline::{Position, ScheduledStep, Timeline};
pub use value::Value;
