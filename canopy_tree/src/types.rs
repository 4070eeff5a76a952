// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the tree engine: node identifiers, options, and errors.

/// Identifier for a node in the tree (generational).
///
/// A `NodeId` pairs a slot index with the generation the slot had when the
/// node was created. Removing a node bumps the slot's generation, so stale
/// identifiers held by a host can never alias a later node in the same slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Which child slot of a node is meant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// The left (smaller-or-equal) child slot.
    Left,
    /// The right (greater-or-equal) child slot.
    Right,
}

impl Side {
    /// The opposite slot.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Direction of a rebalancing rotation.
///
/// A left-heavy subtree is rotated [`Rotation::Right`]; a right-heavy
/// subtree is rotated [`Rotation::Left`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Rotation {
    /// Rotate left (the subtree is right-heavy).
    Left,
    /// Rotate right (the subtree is left-heavy).
    Right,
}

bitflags::bitflags! {
    /// Behavior switches for a [`Tree`](crate::Tree).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TreeOptions: u8 {
        /// Keep the tree AVL-balanced: after every insert and delete, check
        /// each affected ancestor and rotate where the balance factor leaves
        /// the `-1..=1` band. Without this flag the tree is a plain BST and
        /// degrades to a chain under sorted input.
        const AVL_REBALANCE    = 0b0000_0001;
        /// Allow equal values to coexist.
        ///
        /// Off (the default): an insert that meets an equal value anywhere on
        /// its descent path stops and returns the existing node, with no
        /// structural change.
        ///
        /// On: the equality short-circuit is skipped; ties compare as "not
        /// less" and route into the right subtree, so equal values may
        /// legally appear as right-side descendants. `delete` and `find`
        /// then address the first equal node on the descent path.
        const ALLOW_DUPLICATES = 0b0000_0010;
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self::AVL_REBALANCE
    }
}

/// Recoverable failures of tree operations.
///
/// Everything here is reported to the immediate caller and leaves the tree
/// unchanged. Structural corruption (a bad rotation shape, a stale cached
/// height) is a programming fault and panics instead — it is never returned
/// as a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The operation needs at least one node, but the tree is empty.
    #[error("tree is empty")]
    EmptyTree,
    /// The requested value is not present in the tree.
    #[error("value not found in the tree")]
    NotFound,
    /// The requested child slot is already occupied.
    #[error("child slot is already occupied")]
    InvalidState,
}

/// Comparison and traversal tallies for the operation in flight.
///
/// Reset at the start of every public operation and folded into the tree's
/// [`TreeStats`](canopy_stats::TreeStats) when it completes.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct OpCounters {
    pub(crate) comparisons: u32,
    pub(crate) traversals: u32,
}
