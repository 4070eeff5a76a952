// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fast-forward in action: a queued operation hurries the current one.
//!
//! One thread runs a slowly-narrated insert; the main thread queues another
//! operation behind it. The queued arrival engages the gate's fast-forward
//! flag, the paced narrator stops sleeping, and the first operation finishes
//! almost immediately — having still executed every step.
//!
//! Run:
//! - `cargo run -p canopy_demos --example fast_forward`

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use canopy_gate::{FastForward, Serialized};
use canopy_tree::{Narrator, Pause, Tree, TreeOptions};

/// Sleeps on pause requests unless fast-forward is engaged.
#[derive(Debug, Default)]
struct Paced {
    fast: Option<FastForward>,
    skipped: usize,
    honored: usize,
}

impl Narrator for Paced {
    fn on_pause(&mut self, pause: Pause) {
        if self.fast.as_ref().is_some_and(FastForward::engaged) {
            self.skipped += 1;
            return;
        }
        self.honored += 1;
        thread::sleep(match pause {
            Pause::Short => Duration::from_millis(20),
            Pause::Medium => Duration::from_millis(40),
            Pause::Long => Duration::from_millis(80),
        });
    }
}

fn main() {
    let shared = Arc::new(Serialized::new(Tree::with_narrator(
        TreeOptions::default(),
        Paced::default(),
    )));
    let fast = shared.fast_forward();
    shared.with(|tree| tree.narrator_mut().fast = Some(fast));

    // Warm the tree up so the animated insert below has a real path to walk.
    shared.with(|tree| {
        for v in [50, 25, 75, 12, 37, 62, 87] {
            tree.insert(v);
        }
    });

    let animated = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            let start = Instant::now();
            shared.with(|tree| tree.insert(40));
            start.elapsed()
        })
    };

    // Give the animated insert a head start, then barge in. Admission
    // engages fast-forward for the operation in flight.
    thread::sleep(Duration::from_millis(30));
    let start = Instant::now();
    shared.with(|tree| {
        tree.insert(41);
    });
    let queued_time = start.elapsed();
    let animated_time = animated.join().expect("animated insert panicked");

    shared.with(|tree| {
        let (honored, skipped) = (tree.narrator().honored, tree.narrator().skipped);
        println!("animated insert took {animated_time:?} (pauses honored: {honored})");
        println!("queued insert waited {queued_time:?} (pauses skipped: {skipped})");
        assert!(tree.find(&40).is_ok());
        assert!(tree.find(&41).is_ok());
        println!("both values present; tree height {}", tree.tree_height());
    });
}
