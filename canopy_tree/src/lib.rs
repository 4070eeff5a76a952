// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Tree: an arena-backed binary search tree that narrates its work.
//!
//! Canopy Tree is the mutation engine of an animated tree visualizer, usable
//! on its own as an ordinary (optionally AVL-balanced) search tree.
//!
//! - Implements find, min/max, insert, and delete over a generational node
//!   arena, with rotation-based rebalancing behind a runtime switch.
//! - Reports every comparison, structural edit, and rebalancing checkpoint
//!   to a host-provided [`Narrator`], including requested pause classes and
//!   coarse "structure changed" signals for a layout collaborator.
//! - Tallies comparisons and traversals per operation into
//!   [`TreeStats`](canopy_stats::TreeStats) from the `canopy_stats` crate.
//!
//! ## Where this fits
//!
//! The engine is deliberately sans-I/O: it never renders, sleeps, or spawns.
//! A presentation host implements [`Narrator`] and decides what a step, a
//! highlight, or a pause means — an animated canvas awaits real delays, a
//! test collects strings, the default [`Silent`] host ignores everything.
//! Exclusive admission of operations (and the fast-forward semantics an
//! animated host wants when operations queue up) lives in the sibling
//! `canopy_gate` crate.
//!
//! ## Not a renderer
//!
//! This crate does not compute coordinates, durations, colors, or layout.
//! It only says *what* happened; hosts decide what that looks like.
//!
//! ## API overview
//!
//! - [`Tree`]: the engine; owns the arena, the root, and the statistics.
//! - [`NodeId`]: generational handle of a node; inert once the node dies.
//! - [`TreeOptions`]: behavior switches (AVL rebalancing, duplicate values).
//! - [`Narrator`], [`Emphasis`], [`Pause`], [`Silent`]: the host boundary.
//! - [`TreeError`]: the recoverable failures (empty tree, missing value,
//!   occupied slot). Structural corruption panics instead.
//!
//! Key operations:
//! - [`Tree::insert`], [`Tree::delete`], [`Tree::find`], [`Tree::get_min`],
//!   [`Tree::get_max`] — the narrated logical operations.
//! - [`Tree::spawn_child`], [`Tree::adopt_child`],
//!   [`Tree::detach_from_parent`], [`Tree::swap_values`] — the structural
//!   primitives the operations are built from.
//! - [`Tree::traverse`] / [`Tree::iter`] (level order),
//!   [`Tree::ancestors`], [`Tree::rows`] — traversals.
//! - [`Tree::assert_invariants`] / [`Tree::assert_avl_balance`] — full-tree
//!   self-checks for tests and debug builds.
//!
//! ## Example
//!
//! ```rust
//! use canopy_tree::{Tree, TreeError, TreeOptions};
//!
//! let mut tree = Tree::new(TreeOptions::default());
//! for v in [5, 3, 8, 1] {
//!     tree.insert(v);
//! }
//!
//! let min = tree.get_min()?;
//! assert_eq!(tree.value(min), Some(&1));
//!
//! tree.delete(&3)?;
//! assert_eq!(tree.find(&3), Err(TreeError::NotFound));
//! # Ok::<(), TreeError>(())
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod narrate;
mod node;
mod tree;
mod types;

pub use canopy_stats::{OpKind, OpSample, TreeStats};
pub use narrate::{Emphasis, Narrator, Pause, Silent};
pub use node::{Ancestors, Traverse};
pub use tree::Tree;
pub use types::{NodeId, Rotation, Side, TreeError, TreeOptions};
