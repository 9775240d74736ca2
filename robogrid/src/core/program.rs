//! Learner-authored instruction tree, stored as an arena.
//!
//! Nodes are addressed by stable [`NodeId`]s handed out in authoring order.
//! Loops keep their body as an ordered list of child ids and every node
//! records its parent, so edits touch only the affected sequence instead of
//! rebuilding the tree.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::InstructionKind;

/// Repeat count used when a loop is authored without one.
pub const DEFAULT_REPEAT_COUNT: u32 = 3;

/// Stable identity of an authored instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operation carried by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    Wait,
    Jump,
    Stop,
    Loop {
        repeat_count: u32,
        children: Vec<NodeId>,
    },
}

impl Op {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Op::Forward => InstructionKind::Forward,
            Op::Back => InstructionKind::Back,
            Op::TurnLeft => InstructionKind::TurnLeft,
            Op::TurnRight => InstructionKind::TurnRight,
            Op::Wait => InstructionKind::Wait,
            Op::Jump => InstructionKind::Jump,
            Op::Stop => InstructionKind::Stop,
            Op::Loop { .. } => InstructionKind::Loop,
        }
    }

    fn from_kind(kind: InstructionKind, repeat_count: u32) -> Self {
        match kind {
            InstructionKind::Forward => Op::Forward,
            InstructionKind::Back => Op::Back,
            InstructionKind::TurnLeft => Op::TurnLeft,
            InstructionKind::TurnRight => Op::TurnRight,
            InstructionKind::Wait => Op::Wait,
            InstructionKind::Jump => Op::Jump,
            InstructionKind::Stop => Op::Stop,
            InstructionKind::Loop => Op::Loop {
                repeat_count: repeat_count.max(1),
                children: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Enclosing loop, or `None` for top-level instructions.
    pub parent: Option<NodeId>,
    pub op: Op,
}

/// Ordered forest of instruction nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u32,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction to the root sequence, or to the body of the loop
    /// `parent`.
    ///
    /// Loops get [`DEFAULT_REPEAT_COUNT`]. Returns `None` and leaves the tree
    /// untouched when `parent` does not name a loop.
    pub fn append(&mut self, kind: InstructionKind, parent: Option<NodeId>) -> Option<NodeId> {
        self.insert(Op::from_kind(kind, DEFAULT_REPEAT_COUNT), parent)
    }

    /// Append a loop with an explicit repeat count (clamped to at least 1).
    pub fn append_loop(&mut self, repeat_count: u32, parent: Option<NodeId>) -> Option<NodeId> {
        self.insert(Op::from_kind(InstructionKind::Loop, repeat_count), parent)
    }

    fn insert(&mut self, op: Op, parent: Option<NodeId>) -> Option<NodeId> {
        let id = NodeId(self.next_id);
        match parent {
            None => self.roots.push(id),
            Some(parent_id) => match self.nodes.get_mut(&parent_id).map(|node| &mut node.op) {
                Some(Op::Loop { children, .. }) => children.push(id),
                _ => return None,
            },
        }
        self.next_id += 1;
        self.nodes.insert(id, Node { id, parent, op });
        Some(id)
    }

    /// Remove a node and its whole subtree, wherever it is nested.
    ///
    /// Returns `false` if `id` is unknown.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let parent = node.parent;
        let siblings = match parent {
            None => &mut self.roots,
            Some(parent_id) => match self.nodes.get_mut(&parent_id).map(|node| &mut node.op) {
                Some(Op::Loop { children, .. }) => children,
                _ => return false,
            },
        };
        siblings.retain(|child| *child != id);
        self.drop_subtree(id);
        true
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Op::Loop { children, .. } = node.op {
            for child in children {
                self.drop_subtree(child);
            }
        }
    }

    /// Empty the program. Ids are never reused afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Move the instruction at `from` to `to` within one sequence (the root
    /// sequence, or the body of loop `parent`).
    ///
    /// Returns `false` when either index is out of range or `parent` is not a
    /// loop.
    pub fn reorder(&mut self, parent: Option<NodeId>, from: usize, to: usize) -> bool {
        let sequence = match parent {
            None => &mut self.roots,
            Some(parent_id) => match self.nodes.get_mut(&parent_id).map(|node| &mut node.op) {
                Some(Op::Loop { children, .. }) => children,
                _ => return false,
            },
        };
        if from >= sequence.len() || to >= sequence.len() {
            return false;
        }
        let moved = sequence.remove(from);
        sequence.insert(to, moved);
        true
    }

    /// Change the repeat count of an existing loop (clamped to at least 1).
    pub fn set_repeat_count(&mut self, id: NodeId, count: u32) -> bool {
        match self.nodes.get_mut(&id).map(|node| &mut node.op) {
            Some(Op::Loop { repeat_count, .. }) => {
                *repeat_count = count.max(1);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Top-level instruction ids in order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Body of loop `id`; empty for non-loop or unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(&id).map(|node| &node.op) {
            Some(Op::Loop { children, .. }) => children,
            _ => &[],
        }
    }

    /// Number of top-level instructions. This is the move count used for scoring.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes, nested ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every instruction kind used anywhere in the tree.
    pub fn kinds_used(&self) -> BTreeSet<InstructionKind> {
        self.nodes.values().map(|node| node.op.kind()).collect()
    }
}
