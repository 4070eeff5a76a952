// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage and the primitive structural edits.
//!
//! Nodes live in a slot arena on the [`Tree`]; parent and child links are
//! generational [`NodeId`]s, so the parent back-reference can never form an
//! ownership cycle. Each live node is referenced by exactly one parent slot
//! (or is the root), and every link change goes through the primitives here:
//! [`Tree::spawn_child`], [`Tree::adopt_child`], [`Tree::detach_from_parent`],
//! and [`Tree::swap_values`]. Higher-level operations (insert, delete,
//! rotations) are composed from these in `tree.rs`.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::narrate::Narrator;
use crate::tree::Tree;
use crate::types::{NodeId, Side, TreeError};

/// One arena slot: a value plus its links and cached subtree height.
#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// Cached height of the subtree rooted here; a leaf has height 1.
    pub(crate) height: u32,
    pub(crate) value: T,
}

impl<T> Node<T> {
    pub(crate) fn new(generation: u32, value: T) -> Self {
        Self {
            generation,
            parent: None,
            left: None,
            right: None,
            height: 1,
            value,
        }
    }
}

impl<T, N: Narrator> Tree<T, N> {
    /// Returns `true` if `id` refers to a live node.
    ///
    /// A `NodeId` is live if its slot is occupied and its generation matches
    /// the slot's current generation. Stale identifiers are inert: accessors
    /// return `None` for them.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    /// The value held by a live node, or `None` for stale ids.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        if !self.is_alive(id) {
            return None;
        }
        Some(&self.node(id).value)
    }

    /// The parent of a live node, or `None` for roots and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        self.node(id).parent
    }

    /// The child of a live node on `side`, or `None` if absent or stale.
    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let n = self.node(id);
        match side {
            Side::Left => n.left,
            Side::Right => n.right,
        }
    }

    /// Returns `true` if the node has no children. Stale ids are not leaves.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let n = self.node(id);
        n.left.is_none() && n.right.is_none()
    }

    /// Cached subtree height of a live node (a leaf reads 1), 0 for stale ids.
    pub fn height(&self, id: NodeId) -> u32 {
        if !self.is_alive(id) {
            return 0;
        }
        self.node(id).height
    }

    fn child_height(&self, child: Option<NodeId>) -> u32 {
        child.map_or(0, |c| self.node(c).height)
    }

    /// Recompute this node's height from its children and store it.
    ///
    /// Only this node is touched; callers refresh ancestor chains themselves,
    /// children before parents.
    pub fn refresh_height(&mut self, id: NodeId) {
        let n = self.node(id);
        let h = 1 + self.child_height(n.left).max(self.child_height(n.right));
        self.node_mut(id).height = h;
    }

    /// Height recomputed from scratch, ignoring the cache. Used by the
    /// invariant checker to validate cached heights.
    pub(crate) fn computed_height(&self, id: NodeId) -> u32 {
        let n = self.node(id);
        let l = n.left.map_or(0, |c| self.computed_height(c));
        let r = n.right.map_or(0, |c| self.computed_height(c));
        1 + l.max(r)
    }

    /// How much taller the left subtree is than the right one.
    ///
    /// An absent child counts as height 0; a result outside `-1..=1` marks
    /// the node as unbalanced.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Subtree heights are far below i32::MAX."
    )]
    pub fn balance_factor(&self, id: NodeId) -> i32 {
        let n = self.node(id);
        let l = self.child_height(n.left) as i64;
        let r = self.child_height(n.right) as i64;
        (l - r) as i32
    }

    /// Distance to the root, walking parent links. The root has depth 0 and
    /// stale ids report 0.
    ///
    /// This is O(depth) and deliberately uncached.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count().saturating_sub(1)
    }

    /// Allocate a fresh slot for `value`, reusing freed slots when possible.
    pub(crate) fn alloc(&mut self, value: T) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, value));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, value)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        self.len += 1;
        NodeId::new(idx, generation)
    }

    /// Release a slot. The node must already be detached and childless.
    pub(crate) fn free(&mut self, id: NodeId) {
        let n = self.node(id);
        debug_assert!(
            n.parent.is_none() && n.left.is_none() && n.right.is_none(),
            "only detached leaves may be freed"
        );
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
        self.len -= 1;
    }

    fn link_child(&mut self, parent: NodeId, side: Side, child: NodeId) {
        {
            let p = self.node_mut(parent);
            match side {
                Side::Left => p.left = Some(child),
                Side::Right => p.right = Some(child),
            }
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// Grow a new leaf holding `value` under `parent` on `side`.
    ///
    /// Fails with [`TreeError::InvalidState`] if the slot is occupied.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        value: T,
        side: Side,
    ) -> Result<NodeId, TreeError> {
        if self.child(parent, side).is_some() {
            return Err(TreeError::InvalidState);
        }
        let id = self.alloc(value);
        self.link_child(parent, side, id);
        Ok(id)
    }

    /// Remove the link between a node and its parent. Idempotent: detaching
    /// a root is a no-op.
    pub fn detach_from_parent(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let p = self.node_mut(parent);
        if p.left == Some(id) {
            p.left = None;
        } else if p.right == Some(id) {
            p.right = None;
        } else {
            unreachable!("parent does not hold this child");
        }
        self.node_mut(id).parent = None;
    }

    /// Exchange the values of two nodes in place.
    ///
    /// Structural position, links, and heights are untouched; this is how an
    /// internal node's deletion is reduced to deleting a leaf.
    pub fn swap_values(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let (ai, bi) = (a.idx(), b.idx());
        let (first, second) = if ai < bi { (ai, bi) } else { (bi, ai) };
        let (lo, hi) = self.nodes.split_at_mut(second);
        let x = lo[first].as_mut().expect("dangling NodeId");
        let y = hi[0].as_mut().expect("dangling NodeId");
        core::mem::swap(&mut x.value, &mut y.value);
    }

    /// Level-order traversal starting at `from` (inclusive, `from` first).
    ///
    /// Each call returns a fresh iterator over the current structure.
    pub fn traverse(&self, from: NodeId) -> Traverse<'_, T, N> {
        let mut queue = VecDeque::new();
        if self.is_alive(from) {
            queue.push_back(from);
        }
        Traverse { tree: self, queue }
    }

    /// Level-order traversal of the whole tree, root first. Empty trees
    /// yield nothing.
    pub fn iter(&self) -> Traverse<'_, T, N> {
        match self.root {
            Some(root) => self.traverse(root),
            None => Traverse {
                tree: self,
                queue: VecDeque::new(),
            },
        }
    }

    /// The chain `from`, parent, grandparent, … up to and including the root.
    pub fn ancestors(&self, from: NodeId) -> Ancestors<'_, T, N> {
        Ancestors {
            tree: self,
            current: if self.is_alive(from) { Some(from) } else { None },
        }
    }

    /// All nodes grouped by depth, shallowest row first; nodes within a row
    /// appear in level-order. A layout host maps rows to vertical tiers.
    pub fn rows(&self) -> Vec<Vec<NodeId>> {
        let mut rows: Vec<Vec<NodeId>> = Vec::new();
        for id in self.iter() {
            let d = self.depth(id);
            if rows.len() <= d {
                rows.push(Vec::new());
            }
            rows[d].push(id);
        }
        rows
    }
}

impl<T: Ord, N: Narrator> Tree<T, N> {
    /// Attach `node` under `parent`, choosing the side by value order (ties
    /// go right).
    ///
    /// If the ordering-chosen slot is occupied, the occupant is displaced:
    /// it is detached and recursively adopted under the incoming node. The
    /// rotation code relies on this to move a pivot's inner subtree across
    /// to the demoted node in one motion.
    ///
    /// Refused (silent no-op) when `node` is `parent` itself or when `node`
    /// already occupies that exact slot.
    pub fn adopt_child(&mut self, parent: NodeId, node: NodeId) {
        if parent == node {
            return;
        }
        let side = if self.node(node).value < self.node(parent).value {
            Side::Left
        } else {
            Side::Right
        };
        self.adopt_child_on(parent, node, side);
    }

    /// [`Tree::adopt_child`] with the slot chosen by the caller instead of
    /// by value order. Rotations use this: the demoted node must land on the
    /// pivot's far side even when values tie.
    pub(crate) fn adopt_child_on(&mut self, parent: NodeId, node: NodeId, side: Side) {
        if parent == node {
            return;
        }
        if self.child(parent, side) == Some(node) {
            return;
        }
        self.detach_from_parent(node);
        match self.child(parent, side) {
            None => self.link_child(parent, side, node),
            Some(occupant) => {
                // Forced displacement: the occupant moves down under the
                // incoming node, on whichever side its value dictates.
                self.detach_from_parent(occupant);
                self.link_child(parent, side, node);
                self.adopt_child(node, occupant);
            }
        }
    }
}

/// Level-order iterator over a subtree. See [`Tree::traverse`].
pub struct Traverse<'a, T, N: Narrator> {
    tree: &'a Tree<T, N>,
    queue: VecDeque<NodeId>,
}

impl<T, N: Narrator> Iterator for Traverse<'_, T, N> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        let n = self.tree.node(id);
        if let Some(l) = n.left {
            self.queue.push_back(l);
        }
        if let Some(r) = n.right {
            self.queue.push_back(r);
        }
        Some(id)
    }
}

impl<T, N: Narrator> fmt::Debug for Traverse<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traverse")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Ancestor-chain iterator, self first, root last. See [`Tree::ancestors`].
pub struct Ancestors<'a, T, N: Narrator> {
    tree: &'a Tree<T, N>,
    current: Option<NodeId>,
}

impl<T, N: Narrator> Iterator for Ancestors<'_, T, N> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.node(id).parent;
        Some(id)
    }
}

impl<T, N: Narrator> fmt::Debug for Ancestors<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestors")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
