//! Acquisition of the tweening primitive.
//!
//! The engine polls its loader from the frame callback until the loader
//! resolves, then drops it. A loader is therefore asked for a primitive at most
//! once per engine.

use std::fmt;

use crate::primitive::{TweenPrimitive, Tweener};

pub enum LoadPoll {
    Pending,
    Ready(Box<dyn TweenPrimitive>),
    Failed(String),
}

impl fmt::Debug for LoadPoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPoll::Pending => write!(f, "Pending"),
            LoadPoll::Ready(_) => write!(f, "Ready(..)"),
            LoadPoll::Failed(reason) => write!(f, "Failed({reason:?})"),
        }
    }
}

pub trait PrimitiveLoader {
    fn poll(&mut self) -> LoadPoll;
}

impl<F> PrimitiveLoader for F
where
    F: FnMut() -> LoadPoll,
{
    fn poll(&mut self) -> LoadPoll {
        self()
    }
}

/// Yields a [`Tweener`] after `pending` polls have returned `Pending`.
#[derive(Debug, Clone)]
pub struct ReadyAfter {
    pending: u32,
    seed: Option<u64>,
}

impl ReadyAfter {
    pub fn new(pending: u32) -> Self {
        Self {
            pending,
            seed: None,
        }
    }

    pub fn immediately() -> Self {
        Self::new(0)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

impl PrimitiveLoader for ReadyAfter {
    fn poll(&mut self) -> LoadPoll {
        if self.pending > 0 {
            self.pending -= 1;
            return LoadPoll::Pending;
        }
        LoadPoll::Ready(Box::new(Tweener::new(self.seed)))
    }
}

/// A loader that never succeeds, for hosts where animation is switched off.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PrimitiveLoader for Unavailable {
    fn poll(&mut self) -> LoadPoll {
        LoadPoll::Failed(self.reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_after_counts_down() {
        let mut loader = ReadyAfter::new(2);
        assert!(matches!(loader.poll(), LoadPoll::Pending));
        assert!(matches!(loader.poll(), LoadPoll::Pending));
        assert!(matches!(loader.poll(), LoadPoll::Ready(_)));
    }

    #[test]
    fn closures_are_loaders() {
        let mut calls = 0;
        let mut loader = move || {
            calls += 1;
            if calls < 2 {
                LoadPoll::Pending
            } else {
                LoadPoll::Failed("offline".into())
            }
        };
        assert!(matches!(PrimitiveLoader::poll(&mut loader), LoadPoll::Pending));
        assert!(matches!(
            PrimitiveLoader::poll(&mut loader),
            LoadPoll::Failed(r) if r == "offline"
        ));
    }
}
