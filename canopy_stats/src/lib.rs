// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Stats: append-only operation statistics for tree engines.
//!
//! A tree engine counts the comparisons and node-to-node traversals each
//! logical operation performed and folds them into a [`TreeStats`] at the end
//! of the operation, together with the tree size at the operation's start.
//! Hosts read the raw series back per operation kind, or ask for a series
//! averaged per tree size — the natural x-axis for "cost vs. size" plots.
//!
//! The store only ever grows: [`TreeStats::record`] appends, nothing mutates
//! or truncates, and recording never fails. Averaged groups are reported in
//! the order their tree size was first seen, not sorted.
//!
//! # Example
//!
//! ```rust
//! use canopy_stats::{OpKind, OpSample, TreeStats};
//!
//! let mut stats = TreeStats::new();
//! stats.record(OpKind::Insert, OpSample::new(2.0, 3.0, 5));
//! stats.record(OpKind::Insert, OpSample::new(4.0, 5.0, 5));
//!
//! let avg = stats.averaged(OpKind::Insert);
//! assert_eq!(avg, vec![OpSample::new(3.0, 4.0, 5)]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use hashbrown::HashMap;

/// The kind of logical operation a sample was gathered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A value insertion.
    Insert,
    /// A value deletion.
    Delete,
    /// A value search (find / min / max).
    Search,
}

/// Counts gathered over one logical operation.
///
/// `comparisons` and `traversals` are floats so the same type can carry both
/// raw per-operation counts and per-group averages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpSample {
    /// Value-to-value comparisons performed.
    pub comparisons: f64,
    /// Node-to-node moves (descending or walking ancestor chains).
    pub traversals: f64,
    /// Number of values in the tree when the operation started.
    pub tree_size: usize,
}

impl OpSample {
    /// Create a sample.
    pub const fn new(comparisons: f64, traversals: f64, tree_size: usize) -> Self {
        Self {
            comparisons,
            traversals,
            tree_size,
        }
    }
}

/// Append-only statistics, one series per [`OpKind`].
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    insert: Vec<OpSample>,
    delete: Vec<OpSample>,
    search: Vec<OpSample>,
}

impl TreeStats {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            insert: Vec::new(),
            delete: Vec::new(),
            search: Vec::new(),
        }
    }

    fn series(&self, kind: OpKind) -> &Vec<OpSample> {
        match kind {
            OpKind::Insert => &self.insert,
            OpKind::Delete => &self.delete,
            OpKind::Search => &self.search,
        }
    }

    fn series_mut(&mut self, kind: OpKind) -> &mut Vec<OpSample> {
        match kind {
            OpKind::Insert => &mut self.insert,
            OpKind::Delete => &mut self.delete,
            OpKind::Search => &mut self.search,
        }
    }

    /// Append a sample to the series for `kind`. Never blocks, never fails.
    pub fn record(&mut self, kind: OpKind, sample: OpSample) {
        self.series_mut(kind).push(sample);
    }

    /// The raw recorded series for `kind`, in recording order.
    pub fn samples(&self, kind: OpKind) -> &[OpSample] {
        self.series(kind)
    }

    /// Total number of samples recorded for `kind`.
    pub fn len(&self, kind: OpKind) -> usize {
        self.series(kind).len()
    }

    /// Returns `true` if nothing has been recorded for `kind`.
    pub fn is_empty(&self, kind: OpKind) -> bool {
        self.series(kind).is_empty()
    }

    /// Average comparisons and traversals per tree size for `kind`.
    ///
    /// Samples are grouped by [`OpSample::tree_size`]; each group yields one
    /// output sample with the group's mean comparisons and traversals. Groups
    /// appear in the order their size was first recorded.
    pub fn averaged(&self, kind: OpKind) -> Vec<OpSample> {
        // (size, comparison sum, traversal sum, count), in first-seen order.
        let mut groups: Vec<(usize, f64, f64, usize)> = Vec::new();
        let mut by_size: HashMap<usize, usize> = HashMap::new();

        for s in self.series(kind) {
            let slot = *by_size.entry(s.tree_size).or_insert_with(|| {
                groups.push((s.tree_size, 0.0, 0.0, 0));
                groups.len() - 1
            });
            let g = &mut groups[slot];
            g.1 += s.comparisons;
            g.2 += s.traversals;
            g.3 += 1;
        }

        groups
            .into_iter()
            .map(|(size, comparisons, traversals, n)| {
                let n = n as f64;
                OpSample::new(comparisons / n, traversals / n, size)
            })
            .collect()
    }
}
