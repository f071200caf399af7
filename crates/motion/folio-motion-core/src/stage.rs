//! Stage: the host's visual tree as seen by the motion layer.
//!
//! The engine only ever holds [`ElementId`]s. Elements are created and removed
//! by the host (or by particle helpers through this trait), so a tween must
//! check [`Stage::contains`] before every write.

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::ElementId;
use crate::value::Value;

pub trait Stage {
    /// Whether the element is still mounted.
    fn contains(&self, element: ElementId) -> bool;
    fn read(&self, element: ElementId, property: &str) -> Option<Value>;
    fn write(&mut self, element: ElementId, property: &str, value: Value);
    /// Create an element under `parent`; `None` when the parent is gone.
    fn create_child(&mut self, parent: ElementId, kind: &str) -> Option<ElementId>;
    /// Remove an element and its subtree. Returns false if it was already gone.
    fn remove(&mut self, element: ElementId) -> bool;
}

/// One or many targets, in enumeration order, without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets(Vec<ElementId>);

impl Targets {
    pub fn new(elements: impl IntoIterator<Item = ElementId>) -> Self {
        let mut out: Vec<ElementId> = Vec::new();
        for e in elements {
            if !out.contains(&e) {
                out.push(e);
            }
        }
        Self(out)
    }

    pub fn none() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[ElementId] {
        &self.0
    }
}

impl From<ElementId> for Targets {
    fn from(e: ElementId) -> Self {
        Self(vec![e])
    }
}

impl From<Vec<ElementId>> for Targets {
    fn from(v: Vec<ElementId>) -> Self {
        Self::new(v)
    }
}

impl From<&[ElementId]> for Targets {
    fn from(v: &[ElementId]) -> Self {
        Self::new(v.iter().copied())
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    props: IndexMap<String, Value>,
}

/// In-memory stage for headless hosts and tests.
#[derive(Debug, Default)]
pub struct HeadlessStage {
    nodes: HashMap<ElementId, Node>,
    next_id: u32,
    writes: u64,
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: &str, parent: Option<ElementId>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.nodes.insert(
            id,
            Node {
                kind: kind.to_string(),
                parent,
                children: Vec::new(),
                props: IndexMap::new(),
            },
        );
        id
    }

    /// Mount a top-level element (a page region or container).
    pub fn create_root(&mut self, kind: &str) -> ElementId {
        self.alloc(kind, None)
    }

    pub fn children(&self, parent: ElementId) -> &[ElementId] {
        self.nodes
            .get(&parent)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn kind(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(&element).map(|n| n.kind.as_str())
    }

    pub fn props(&self, element: ElementId) -> Option<&IndexMap<String, Value>> {
        self.nodes.get(&element).map(|n| &n.props)
    }

    /// Total property writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Stage for HeadlessStage {
    fn contains(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    fn read(&self, element: ElementId, property: &str) -> Option<Value> {
        self.nodes.get(&element)?.props.get(property).cloned()
    }

    fn write(&mut self, element: ElementId, property: &str, value: Value) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.props.insert(property.to_string(), value);
            self.writes += 1;
        }
    }

    fn create_child(&mut self, parent: ElementId, kind: &str) -> Option<ElementId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.alloc(kind, Some(parent));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    fn remove(&mut self, element: ElementId) -> bool {
        let Some(node) = self.nodes.remove(&element) else {
            return false;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != element);
        }
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(n) = self.nodes.remove(&child) {
                stack.extend(n.children);
            }
        }
        true
    }
}
