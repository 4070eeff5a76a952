// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutation engine: find, min/max, insert, delete, and rotations.
//!
//! All operations narrate their progress step by step (see
//! [`Narrator`]) and tally comparisons and traversals into the tree's
//! [`TreeStats`]. Recoverable conditions come back as [`TreeError`];
//! structural corruption is a bug and panics.

use alloc::format;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use canopy_stats::{OpKind, OpSample, TreeStats};
use smallvec::{SmallVec, smallvec};

use crate::narrate::{Emphasis, Narrator, Pause, Silent};
use crate::node::Node;
use crate::types::{NodeId, OpCounters, Rotation, Side, TreeError, TreeOptions};

/// A binary search tree, optionally AVL-balanced, that narrates every step
/// of its operations to a host-provided [`Narrator`].
///
/// Nodes live in a generational slot arena; hosts address them through
/// [`NodeId`]s, which stay valid until the node is deleted and are inert
/// afterwards. The narrator type parameter defaults to [`Silent`], so a
/// plain `Tree<i32>` behaves like an ordinary container.
///
/// At most one logical operation may run at a time. The tree itself takes
/// `&mut self` and therefore cannot race, but hosts that drive it from
/// several tasks should serialize access through `canopy_gate`, which adds
/// the fast-forward semantics animated hosts want.
///
/// ## Example
///
/// ```rust
/// use canopy_tree::{Tree, TreeOptions};
///
/// let mut tree = Tree::new(TreeOptions::default());
/// for v in [10, 20, 30] {
///     tree.insert(v);
/// }
///
/// // The sorted insert forced a left rotation: 20 is the new root.
/// let root = tree.root().unwrap();
/// assert_eq!(tree.value(root), Some(&20));
/// assert_eq!(tree.tree_height(), 2);
/// ```
pub struct Tree<T, N: Narrator = Silent> {
    /// slots
    pub(crate) nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    pub(crate) generations: Vec<u32>,
    pub(crate) free_list: Vec<usize>,
    pub(crate) root: Option<NodeId>,
    /// live node count
    pub(crate) len: usize,
    pub(crate) options: TreeOptions,
    pub(crate) narrator: N,
    pub(crate) counters: OpCounters,
    pub(crate) stats: TreeStats,
}

impl<T, N: Narrator> fmt::Debug for Tree<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.nodes.len();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &self.len)
            .field("free_list", &free)
            .field("root", &self.root)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T> Tree<T> {
    /// Create an empty tree with a [`Silent`] narrator.
    pub fn new(options: TreeOptions) -> Self {
        Self::with_narrator(options, Silent)
    }
}

impl<T, N: Narrator + Default> Default for Tree<T, N> {
    fn default() -> Self {
        Self::with_narrator(TreeOptions::default(), N::default())
    }
}

impl<T, N: Narrator> Tree<T, N> {
    /// Create an empty tree that narrates to `narrator`.
    pub fn with_narrator(options: TreeOptions, narrator: N) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: None,
            len: 0,
            options,
            narrator,
            counters: OpCounters::default(),
            stats: TreeStats::new(),
        }
    }

    /// The root node, if the tree is non-empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the whole tree: 0 when empty, 1 for a lone root.
    pub fn tree_height(&self) -> u32 {
        self.root.map_or(0, |r| self.node(r).height)
    }

    /// The active behavior switches.
    pub fn options(&self) -> TreeOptions {
        self.options
    }

    /// Change behavior switches at runtime.
    ///
    /// Turning [`TreeOptions::AVL_REBALANCE`] on does not retroactively
    /// rebalance an already skewed tree; balance is restored incrementally
    /// as later operations touch the skewed paths.
    pub fn set_options(&mut self, options: TreeOptions) {
        self.options = options;
    }

    /// Borrow the narrator (e.g. to read back a recording host).
    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// Mutably borrow the narrator.
    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    /// Statistics recorded so far, one series per operation kind.
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    fn say(&mut self, text: &str, emphasis: Emphasis) {
        self.narrator.on_step(text, emphasis);
    }
}

impl<T: Ord + fmt::Display, N: Narrator> Tree<T, N> {
    /// Find `value` in the tree.
    ///
    /// Errors with [`TreeError::EmptyTree`] on an empty tree and
    /// [`TreeError::NotFound`] when the descent runs out of children.
    /// Repeating a failed find is side-effect free.
    pub fn find(&mut self, value: &T) -> Result<NodeId, TreeError> {
        let size_before = self.len;
        self.counters = OpCounters::default();
        let result = match self.verify_not_empty() {
            Ok(root) => self.find_from(value, root),
            Err(e) => Err(e),
        };
        self.finish_op(OpKind::Search, size_before);
        result
    }

    /// The node holding the smallest value.
    pub fn get_min(&mut self) -> Result<NodeId, TreeError> {
        let size_before = self.len;
        self.counters = OpCounters::default();
        let result = match self.verify_not_empty() {
            Ok(root) => Ok(self.min_from(root)),
            Err(e) => Err(e),
        };
        self.finish_op(OpKind::Search, size_before);
        result
    }

    /// The node holding the largest value.
    pub fn get_max(&mut self) -> Result<NodeId, TreeError> {
        let size_before = self.len;
        self.counters = OpCounters::default();
        let result = match self.verify_not_empty() {
            Ok(root) => Ok(self.max_from(root)),
            Err(e) => Err(e),
        };
        self.finish_op(OpKind::Search, size_before);
        result
    }

    /// Insert `value`, returning the node that holds it afterwards.
    ///
    /// On an empty tree the value becomes the root. Otherwise the descent
    /// compares at every node — ties sink right — and a new leaf grows in
    /// the first empty slot; on the way back up each ancestor's height is
    /// refreshed and, with [`TreeOptions::AVL_REBALANCE`] set, rebalanced.
    ///
    /// Without [`TreeOptions::ALLOW_DUPLICATES`], meeting an equal value
    /// mid-descent ends the insert and returns the existing node unchanged.
    pub fn insert(&mut self, value: T) -> NodeId {
        let size_before = self.len;
        self.counters = OpCounters::default();
        let id = match self.root {
            None => self.create_root(value),
            Some(root) => {
                let id = self.insert_at(value, root);
                self.narrator.on_pause(Pause::Long);
                self.narrator.on_clear();
                id
            }
        };
        self.finish_op(OpKind::Insert, size_before);
        id
    }

    /// Delete one occurrence of `value`.
    ///
    /// A leaf is detached directly; an internal node first swaps values with
    /// its in-order successor (or, lacking a right subtree, its left child)
    /// and the deletion recurses onto that position until it reaches a leaf.
    /// Every affected ancestor is height-refreshed and rebalanced root-ward.
    pub fn delete(&mut self, value: &T) -> Result<(), TreeError> {
        let size_before = self.len;
        self.counters = OpCounters::default();
        let result = match self.verify_not_empty() {
            Ok(root) => match self.find_from(value, root) {
                Ok(victim) => {
                    self.delete_node(victim);
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.finish_op(OpKind::Delete, size_before);
        result
    }

    // --- internals ---

    fn verify_not_empty(&mut self) -> Result<NodeId, TreeError> {
        match self.root {
            Some(root) => Ok(root),
            None => {
                self.say("Tree is empty", Emphasis::Error);
                self.narrator.on_pause(Pause::Long);
                self.narrator.on_clear();
                Err(TreeError::EmptyTree)
            }
        }
    }

    fn create_root(&mut self, value: T) -> NodeId {
        debug_assert!(self.root.is_none(), "tree already has a root");
        let id = self.alloc(value);
        self.root = Some(id);
        self.narrator.on_structural_change();
        id
    }

    fn find_from(&mut self, value: &T, start: NodeId) -> Result<NodeId, TreeError> {
        let mut curr = start;
        loop {
            self.counters.traversals += 1;
            self.narrator.on_clear();
            self.narrator.on_focus(curr, Emphasis::Working);
            self.say(
                &format!("Comparing {value} to {}", self.node(curr).value),
                Emphasis::Normal,
            );
            self.narrator.on_pause(Pause::Short);

            self.counters.comparisons += 1;
            let ord = value.cmp(&self.node(curr).value);
            if ord == Ordering::Equal {
                self.say(&format!("Found {value}"), Emphasis::Success);
                self.narrator.on_pause(Pause::Long);
                self.narrator.on_clear();
                self.narrator.on_blur(curr);
                return Ok(curr);
            }

            let side = if ord == Ordering::Less {
                Side::Left
            } else {
                Side::Right
            };
            let text = match side {
                Side::Left => format!("{value} is smaller; searching into left subtree"),
                Side::Right => format!("{value} is larger; searching into right subtree"),
            };
            self.say(&text, Emphasis::Normal);
            self.narrator.on_pause(Pause::Medium);
            self.narrator.on_blur(curr);

            match self.child(curr, side) {
                None => {
                    self.say(&format!("Couldn't find {value}"), Emphasis::Error);
                    self.narrator.on_pause(Pause::Long);
                    self.narrator.on_clear();
                    return Err(TreeError::NotFound);
                }
                Some(next) => {
                    self.say("Non-empty leaf; going deeper", Emphasis::Working);
                    self.narrator.on_pause(Pause::Medium);
                    curr = next;
                }
            }
        }
    }

    fn min_from(&mut self, start: NodeId) -> NodeId {
        let mut it = start;
        self.narrator.on_focus(it, Emphasis::Working);
        self.narrator.on_pause(Pause::Short);
        self.narrator.on_blur(it);
        self.say("Traversing to the leftmost node", Emphasis::Normal);
        while let Some(left) = self.child(it, Side::Left) {
            self.counters.traversals += 1;
            it = left;
            self.narrator.on_focus(it, Emphasis::Working);
            self.narrator.on_pause(Pause::Short);
            self.narrator.on_blur(it);
        }
        self.narrator.on_focus(it, Emphasis::Working);
        self.say(
            &format!("Found min == {}", self.node(it).value),
            Emphasis::Success,
        );
        self.narrator.on_pause(Pause::Long);
        self.narrator.on_clear();
        self.narrator.on_blur(it);
        it
    }

    fn max_from(&mut self, start: NodeId) -> NodeId {
        let mut it = start;
        self.narrator.on_focus(it, Emphasis::Working);
        self.narrator.on_pause(Pause::Short);
        self.narrator.on_blur(it);
        self.say("Traversing to the rightmost node", Emphasis::Normal);
        while let Some(right) = self.child(it, Side::Right) {
            self.counters.traversals += 1;
            it = right;
            self.narrator.on_focus(it, Emphasis::Working);
            self.narrator.on_pause(Pause::Short);
            self.narrator.on_blur(it);
        }
        self.narrator.on_focus(it, Emphasis::Working);
        self.say(
            &format!("Found max == {}", self.node(it).value),
            Emphasis::Success,
        );
        self.narrator.on_pause(Pause::Long);
        self.narrator.on_clear();
        self.narrator.on_blur(it);
        it
    }

    fn insert_at(&mut self, value: T, curr: NodeId) -> NodeId {
        self.counters.traversals += 1;
        self.narrator.on_clear();
        self.narrator.on_focus(curr, Emphasis::Working);
        self.say(
            &format!("Comparing {value} to {}", self.node(curr).value),
            Emphasis::Normal,
        );
        self.narrator.on_pause(Pause::Short);

        self.counters.comparisons += 1;
        let ord = value.cmp(&self.node(curr).value);
        if ord == Ordering::Equal && !self.options.contains(TreeOptions::ALLOW_DUPLICATES) {
            self.say("Value already exists in the tree", Emphasis::Success);
            self.narrator.on_pause(Pause::Long);
            self.narrator.on_clear();
            self.narrator.on_blur(curr);
            return curr;
        }

        // Ties are "not less" and sink into the right subtree.
        let side = if ord == Ordering::Less {
            Side::Left
        } else {
            Side::Right
        };
        let text = match side {
            Side::Left => format!("{value} is smaller; inserting into left subtree"),
            Side::Right => format!("{value} is larger; inserting into right subtree"),
        };
        self.say(&text, Emphasis::Normal);
        self.narrator.on_pause(Pause::Medium);

        match self.child(curr, side) {
            None => {
                self.say("Empty leaf; inserting into it", Emphasis::Normal);
                let child = match self.spawn_child(curr, value, side) {
                    Ok(child) => child,
                    Err(_) => unreachable!("slot was just checked to be empty"),
                };
                self.refresh_height(curr);
                self.narrator.on_blur(curr);
                self.narrator.on_pause(Pause::Medium);
                self.narrator.on_structural_change();
                child
            }
            Some(next) => {
                self.narrator.on_blur(curr);
                self.say("Non-empty leaf; going deeper", Emphasis::Working);
                self.narrator.on_pause(Pause::Medium);
                let child = self.insert_at(value, next);
                self.narrator.on_clear();
                self.refresh_height(curr);
                self.rebalance_if_needed(curr);
                child
            }
        }
    }

    fn delete_node(&mut self, victim: NodeId) {
        self.counters.traversals += 1;
        if self.is_leaf(victim) {
            self.say(
                &format!("Deleting leaf {}", self.node(victim).value),
                Emphasis::Normal,
            );
            if self.root == Some(victim) {
                self.root = None;
            }
            self.counters.traversals += 1;
            let parent = self.parent_of(victim);
            self.narrator.on_pause(Pause::Medium);
            self.narrator.on_blur(victim);
            self.detach_from_parent(victim);
            self.free(victim);
            self.narrator.on_structural_change();
            self.narrator.on_clear();

            // Repair the old ancestor chain root-ward. parent_of is re-read
            // live on every lap: a rotation can splice a new ancestor in
            // above the current node, and that one needs repairing too.
            let mut cur = parent;
            while let Some(n) = cur {
                self.counters.traversals += 1;
                self.refresh_height(n);
                self.rebalance_if_needed(n);
                cur = self.parent_of(n);
            }
            self.narrator.on_clear();
            return;
        }

        self.narrator.on_clear();
        self.say(
            &format!("Looking for successor for {}", self.node(victim).value),
            Emphasis::Normal,
        );
        self.narrator.on_pause(Pause::Medium);
        self.counters.traversals += 1;
        let successor = match self.child(victim, Side::Right) {
            Some(right) => self.min_from(right),
            None => match self.child(victim, Side::Left) {
                Some(left) => left,
                None => unreachable!("non-leaf node has a child"),
            },
        };

        self.say("Swapping nodes:", Emphasis::Normal);
        self.say(
            &format!("Node 1: {}", self.node(victim).value),
            Emphasis::Success,
        );
        self.say(
            &format!("Node 2: {}", self.node(successor).value),
            Emphasis::Working,
        );
        self.narrator.on_focus(victim, Emphasis::Success);
        self.narrator.on_focus(successor, Emphasis::Working);
        self.narrator.on_pause(Pause::Medium);
        self.swap_values(victim, successor);
        self.narrator.on_pause(Pause::Medium);
        self.narrator.on_blur(victim);
        self.narrator.on_blur(successor);

        // The successor position now holds the doomed value and has at most
        // one subtree; recurse until the deletion bottoms out at a leaf.
        self.delete_node(successor);
    }

    fn rebalance_if_needed(&mut self, curr: NodeId) {
        if !self.options.contains(TreeOptions::AVL_REBALANCE) {
            return;
        }
        self.counters.traversals += 1;
        let balance = self.balance_factor(curr);
        self.say(&format!("Subtree balance: {balance}"), Emphasis::Normal);
        self.narrator.on_pause(Pause::Medium);

        if balance > 1 {
            self.say("Left subtree is too high; rotating right", Emphasis::Normal);
            self.rotate(curr, Rotation::Right);
            self.narrator.on_pause(Pause::Medium);
        } else if balance < -1 {
            self.say("Right subtree is too high; rotating left", Emphasis::Normal);
            self.rotate(curr, Rotation::Left);
            self.narrator.on_pause(Pause::Medium);
        }
    }

    /// Rotate the subtree rooted at `top`, returning the new subtree head.
    ///
    /// Preconditions: the heavy side of `top` must carry a two-level chain —
    /// either straight (heavy child plus its same-side child) or zig-zag
    /// (heavy child plus its opposite-side child). Calling this on any other
    /// shape is a logic fault and panics; it is never a recoverable error.
    ///
    /// In the zig-zag shape the pivot ("middle") and the demoted heavy child
    /// ("bottom") swap roles relative to their tree positions, and the pivot
    /// additionally adopts the bottom node after the main re-linking.
    pub fn rotate(&mut self, top: NodeId, rotation: Rotation) -> NodeId {
        let parent = self.parent_of(top);
        // Which slot of the parent `top` occupies; the pivot is re-attached
        // onto exactly this slot, not wherever value order would place it.
        let parent_side = parent.map(|p| {
            if self.child(p, Side::Left) == Some(top) {
                Side::Left
            } else {
                Side::Right
            }
        });
        self.counters.traversals += 1;

        // The chain shape follows the heavy child's own lean: a same-side or
        // level lean keeps the heavy child as the pivot (straight chain); an
        // opposite lean promotes the heavy child's inner child instead
        // (zig-zag chain, the double-rotation case).
        let (middle, bottom, zig_zag) = match rotation {
            Rotation::Right => {
                let Some(heavy) = self.child(top, Side::Left) else {
                    unreachable!("right rotation without a left child")
                };
                if self.balance_factor(heavy) >= 0 {
                    let Some(b) = self.child(heavy, Side::Left) else {
                        unreachable!("right rotation without a two-level left chain")
                    };
                    (heavy, b, false)
                } else {
                    let Some(m) = self.child(heavy, Side::Right) else {
                        unreachable!("right rotation without a two-level left chain")
                    };
                    (m, heavy, true)
                }
            }
            Rotation::Left => {
                let Some(heavy) = self.child(top, Side::Right) else {
                    unreachable!("left rotation without a right child")
                };
                if self.balance_factor(heavy) <= 0 {
                    let Some(b) = self.child(heavy, Side::Right) else {
                        unreachable!("left rotation without a two-level right chain")
                    };
                    (heavy, b, false)
                } else {
                    let Some(m) = self.child(heavy, Side::Left) else {
                        unreachable!("left rotation without a two-level right chain")
                    };
                    (m, heavy, true)
                }
            }
        };
        self.counters.traversals += 3;

        // The demoted top lands on the pivot's far side: right for a right
        // rotation, left for a left rotation. The zig-zag bottom goes on the
        // other side. Explicit sides keep ties (equal values) well-placed.
        let top_side = match rotation {
            Rotation::Right => Side::Right,
            Rotation::Left => Side::Left,
        };

        self.detach_from_parent(top);
        self.detach_from_parent(middle);
        if zig_zag {
            // Free the top's heavy slot up front: the pivot's inner subtree
            // is displaced into it when the pivot adopts the top below.
            self.detach_from_parent(bottom);
        }

        let dir = match rotation {
            Rotation::Left => "left",
            Rotation::Right => "right",
        };
        self.say(
            &format!("Rotating {dir} around pivot {}", self.node(middle).value),
            Emphasis::Success,
        );

        if zig_zag {
            self.narrated_adoption(middle, bottom, top_side.opposite());
        }
        self.narrated_adoption(middle, top, top_side);
        if let Some(p) = parent {
            let side = parent_side.expect("parent_side is set whenever parent is");
            self.narrated_adoption(p, middle, side);
        }

        if self.root == Some(top) {
            self.root = Some(middle);
        }

        // Children before parents.
        self.refresh_height(top);
        self.refresh_height(bottom);
        self.refresh_height(middle);
        if let Some(p) = parent {
            self.refresh_height(p);
        }
        self.narrator.on_structural_change();
        middle
    }

    /// Adopt `child` under `parent` on an explicit side, narrating the move.
    /// An occupant of the slot is displaced down under `child` by value
    /// order, the same policy as [`Tree::adopt_child`].
    fn narrated_adoption(&mut self, parent: NodeId, child: NodeId, side: Side) {
        self.say(
            &format!(
                "{} adopts {}",
                self.node(parent).value,
                self.node(child).value
            ),
            Emphasis::Normal,
        );
        self.narrator.on_focus(parent, Emphasis::Success);
        self.narrator.on_focus(child, Emphasis::Working);
        self.narrator.on_pause(Pause::Medium);
        self.adopt_child_on(parent, child, side);
        self.narrator.on_structural_change();
        self.narrator.on_pause(Pause::Medium);
        self.narrator.on_blur(parent);
        self.narrator.on_blur(child);
        self.narrator.on_clear();
    }

    fn finish_op(&mut self, kind: OpKind, size_before: usize) {
        let c = core::mem::take(&mut self.counters);
        self.stats.record(
            kind,
            OpSample::new(f64::from(c.comparisons), f64::from(c.traversals), size_before),
        );
        #[cfg(debug_assertions)]
        self.assert_invariants();
    }
}

impl<T: Ord, N: Narrator> Tree<T, N> {
    /// Verify the tree's structural invariants over a full traversal.
    ///
    /// Checked: parent/child links agree, the BST order holds (with ties
    /// legal on either side), every cached height matches a recomputation,
    /// and the reachable node count matches [`Tree::len`]. AVL balance is
    /// deliberately not part of this check — rebalancing can be toggled at
    /// runtime, and a freshly re-enabled tree is repaired incrementally, not
    /// retroactively; use [`Tree::assert_avl_balance`] where balance is
    /// known to have been maintained throughout.
    ///
    /// A violation is a programming fault and panics. Debug builds run this
    /// automatically at the end of every public operation.
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert!(self.len == 0, "empty tree still reports live nodes");
            return;
        };
        assert!(self.node(root).parent.is_none(), "root must not have a parent");

        let mut stack: SmallVec<[NodeId; 16]> = smallvec![root];
        let mut seen = 0_usize;
        while let Some(id) = stack.pop() {
            seen += 1;
            let n = self.node(id);
            if let Some(l) = n.left {
                assert!(
                    self.node(l).parent == Some(id),
                    "left child has a stale parent link"
                );
                assert!(
                    self.node(l).value <= n.value,
                    "left child is larger than its parent"
                );
                stack.push(l);
            }
            if let Some(r) = n.right {
                assert!(
                    self.node(r).parent == Some(id),
                    "right child has a stale parent link"
                );
                assert!(
                    self.node(r).value >= n.value,
                    "right child is smaller than its parent"
                );
                stack.push(r);
            }
            assert!(
                n.height == self.computed_height(id),
                "cached height went stale"
            );
        }
        assert!(
            seen == self.len,
            "live node count does not match the reachable set"
        );
    }

    /// Verify that every node's balance factor lies in `-1..=1`.
    ///
    /// Valid only when [`TreeOptions::AVL_REBALANCE`] was active for the
    /// tree's whole life; a violation then is a programming fault and
    /// panics.
    pub fn assert_avl_balance(&self) {
        let Some(root) = self.root else { return };
        let mut stack: SmallVec<[NodeId; 16]> = smallvec![root];
        while let Some(id) = stack.pop() {
            let balance = self.balance_factor(id);
            assert!(
                (-1..=1).contains(&balance),
                "subtree is out of AVL balance"
            );
            let n = self.node(id);
            if let Some(l) = n.left {
                stack.push(l);
            }
            if let Some(r) = n.right {
                stack.push(r);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    /// Narrator that records everything for assertions.
    #[derive(Debug, Default)]
    struct Recording {
        steps: Vec<(String, Emphasis)>,
        structural_changes: usize,
        pauses: usize,
    }

    impl Narrator for Recording {
        fn on_step(&mut self, text: &str, emphasis: Emphasis) {
            self.steps.push((text.to_string(), emphasis));
        }

        fn on_pause(&mut self, _pause: Pause) {
            self.pauses += 1;
        }

        fn on_structural_change(&mut self) {
            self.structural_changes += 1;
        }
    }

    fn values_level_order<N: Narrator>(tree: &Tree<i32, N>) -> Vec<i32> {
        tree.iter().map(|id| *tree.value(id).unwrap()).collect()
    }

    #[test]
    fn sorted_insert_triggers_single_left_rotation() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [10, 20, 30] {
            tree.insert(v);
        }
        let root = tree.root().unwrap();
        assert_eq!(tree.value(root), Some(&20));
        assert_eq!(
            tree.child(root, Side::Left).and_then(|id| tree.value(id)),
            Some(&10)
        );
        assert_eq!(
            tree.child(root, Side::Right).and_then(|id| tree.value(id)),
            Some(&30)
        );
        assert_eq!(tree.tree_height(), 2);
    }

    #[test]
    fn reverse_sorted_insert_triggers_single_right_rotation() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [30, 20, 10] {
            tree.insert(v);
        }
        assert_eq!(values_level_order(&tree), [20, 10, 30]);
        assert_eq!(tree.tree_height(), 2);
    }

    #[test]
    fn zig_zag_inserts_rotate_around_the_inner_node() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [30, 10, 20] {
            tree.insert(v);
        }
        assert_eq!(values_level_order(&tree), [20, 10, 30]);

        let mut tree = Tree::new(TreeOptions::default());
        for v in [10, 30, 20] {
            tree.insert(v);
        }
        assert_eq!(values_level_order(&tree), [20, 10, 30]);
    }

    #[test]
    fn avl_height_stays_logarithmic_under_sorted_input() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in 1..=32 {
            tree.insert(v);
        }
        assert_eq!(tree.len(), 32);
        // The sparsest AVL tree of height 7 needs 33 nodes, so 32 values
        // must fit in height 6.
        assert!(tree.tree_height() <= 6, "AVL tree degenerated");
        tree.assert_invariants();
        tree.assert_avl_balance();
    }

    #[test]
    fn plain_bst_degrades_to_a_chain() {
        let mut tree = Tree::new(TreeOptions::empty());
        for v in [1, 2, 3] {
            tree.insert(v);
        }
        let root = tree.root().unwrap();
        assert_eq!(tree.value(root), Some(&1));
        assert_eq!(tree.tree_height(), 3);
        assert_eq!(values_level_order(&tree), [1, 2, 3]);
        tree.assert_invariants();
    }

    #[test]
    fn duplicate_insert_returns_existing_node() {
        let mut tree = Tree::new(TreeOptions::default());
        let first = tree.insert(5);
        let second = tree.insert(5);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn duplicates_coexist_when_allowed() {
        let mut tree = Tree::new(TreeOptions::AVL_REBALANCE | TreeOptions::ALLOW_DUPLICATES);
        for _ in 0..3 {
            tree.insert(5);
        }
        assert_eq!(tree.len(), 3);
        // The all-equal chain still rebalances: one node up top, one on
        // each side.
        assert_eq!(tree.tree_height(), 2);
        tree.assert_invariants();
        tree.assert_avl_balance();
    }

    #[test]
    fn find_roundtrips_and_misses_cleanly() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(v);
        }
        let hit = tree.find(&4).unwrap();
        assert_eq!(tree.value(hit), Some(&4));

        assert_eq!(tree.find(&42), Err(TreeError::NotFound));
        // Repeating the miss is side-effect free.
        assert_eq!(tree.find(&42), Err(TreeError::NotFound));
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn empty_tree_operations_report_empty() {
        let mut tree: Tree<i32> = Tree::new(TreeOptions::default());
        assert_eq!(tree.find(&1), Err(TreeError::EmptyTree));
        assert_eq!(tree.get_min(), Err(TreeError::EmptyTree));
        assert_eq!(tree.get_max(), Err(TreeError::EmptyTree));
        assert_eq!(tree.delete(&1), Err(TreeError::EmptyTree));
    }

    #[test]
    fn min_and_max_walk_the_outer_spines() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(v);
        }
        let min = tree.get_min().unwrap();
        let max = tree.get_max().unwrap();
        assert_eq!(tree.value(min), Some(&1));
        assert_eq!(tree.value(max), Some(&9));
    }

    #[test]
    fn delete_leaf_repairs_ancestors() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [5, 3, 8, 1] {
            tree.insert(v);
        }
        tree.delete(&1).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.find(&1), Err(TreeError::NotFound));
        tree.assert_invariants();
    }

    #[test]
    fn delete_sole_root_empties_the_tree() {
        let mut tree = Tree::new(TreeOptions::default());
        tree.insert(7);
        tree.delete(&7).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
    }

    #[test]
    fn delete_node_with_one_child_promotes_it() {
        let mut tree = Tree::new(TreeOptions::empty());
        for v in [5, 3, 2] {
            tree.insert(v);
        }
        // 3 has a single (left) child 2.
        tree.delete(&3).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.find(&3), Err(TreeError::NotFound));
        assert_eq!(values_level_order(&tree), [5, 2]);
        tree.assert_invariants();
    }

    #[test]
    fn delete_internal_node_uses_inorder_successor() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(v);
        }
        // Deleting the root swaps in min(right subtree) == 7.
        tree.delete(&5).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.value(root), Some(&7));
        assert_eq!(tree.find(&5), Err(TreeError::NotFound));
        assert_eq!(tree.len(), 6);
        tree.assert_invariants();
    }

    #[test]
    fn round_trip_leaves_an_empty_tree() {
        for deletion_order in [[5, 3, 8, 1, 4, 7, 9], [1, 9, 4, 7, 3, 8, 5]] {
            let mut tree = Tree::new(TreeOptions::default());
            for v in [5, 3, 8, 1, 4, 7, 9] {
                tree.insert(v);
            }
            for v in deletion_order {
                tree.delete(&v).unwrap();
                tree.assert_invariants();
                tree.assert_avl_balance();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.root(), None);
        }
    }

    #[test]
    fn delete_misses_are_reported_not_applied() {
        let mut tree = Tree::new(TreeOptions::default());
        tree.insert(1);
        assert_eq!(tree.delete(&2), Err(TreeError::NotFound));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn stats_capture_size_before_each_operation() {
        let mut tree = Tree::new(TreeOptions::default());
        tree.insert(10);
        tree.insert(5);
        let _ = tree.find(&5);

        let inserts = tree.stats().samples(OpKind::Insert);
        assert_eq!(inserts.len(), 2);
        assert_eq!(inserts[0].tree_size, 0);
        assert_eq!(inserts[1].tree_size, 1);
        assert!(inserts[1].comparisons >= 1.0);

        let searches = tree.stats().samples(OpKind::Search);
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].tree_size, 2);
    }

    #[test]
    fn narration_reports_outcomes_with_matching_emphasis() {
        let mut tree = Tree::with_narrator(TreeOptions::default(), Recording::default());
        tree.insert(3);
        tree.insert(1);
        assert!(tree.narrator().structural_changes >= 2);

        let _ = tree.find(&3);
        assert!(
            tree.narrator()
                .steps
                .contains(&("Found 3".to_string(), Emphasis::Success)),
            "successful find should narrate with success emphasis"
        );

        let _ = tree.find(&99);
        assert!(
            tree.narrator()
                .steps
                .contains(&("Couldn't find 99".to_string(), Emphasis::Error)),
            "missed find should narrate with error emphasis"
        );
        assert!(tree.narrator().pauses > 0);
    }

    #[test]
    fn rebalancing_can_be_toggled_at_runtime() {
        let mut tree = Tree::new(TreeOptions::default());
        tree.set_options(TreeOptions::empty());
        for v in [1, 2, 3, 4] {
            tree.insert(v);
        }
        assert_eq!(tree.tree_height(), 4);

        // Re-enable and keep inserting; fresh imbalances are repaired.
        tree.set_options(TreeOptions::AVL_REBALANCE);
        tree.insert(5);
        tree.insert(6);
        assert!(tree.tree_height() < 6);
    }

    #[test]
    fn heights_stay_cached_correctly_through_churn() {
        let mut tree = Tree::new(TreeOptions::default());
        for v in [8, 4, 12, 2, 6, 10, 14, 1, 3] {
            tree.insert(v);
        }
        for v in [2, 8, 1] {
            tree.delete(&v).unwrap();
        }
        // assert_invariants recomputes every height from scratch.
        tree.assert_invariants();
        tree.assert_avl_balance();
        assert_eq!(tree.len(), 6);
    }
}
