// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A console host for the tree engine: narration on stdout.
//!
//! Builds a small AVL tree, searches it, deletes through it, and finally
//! prints the averaged operation statistics — everything the engine reports
//! through its `Narrator` boundary, rendered as plain text.
//!
//! Run:
//! - `cargo run -p canopy_demos --example narrated_tree`

use canopy_stats::OpKind;
use canopy_tree::{Emphasis, Narrator, NodeId, Tree, TreeOptions};

/// Renders narration as indented, tagged lines.
#[derive(Debug, Default)]
struct Console {
    focused: Vec<NodeId>,
}

impl Narrator for Console {
    fn on_step(&mut self, text: &str, emphasis: Emphasis) {
        let tag = match emphasis {
            Emphasis::Normal => "     ",
            Emphasis::Working => " ... ",
            Emphasis::Success => "  ok ",
            Emphasis::Error => "  !! ",
        };
        println!("{tag}| {text}");
    }

    fn on_focus(&mut self, node: NodeId, _emphasis: Emphasis) {
        self.focused.push(node);
    }

    fn on_blur(&mut self, node: NodeId) {
        self.focused.retain(|n| *n != node);
    }

    fn on_structural_change(&mut self) {
        println!("     | (layout refresh)");
    }
}

fn main() {
    let mut tree = Tree::with_narrator(TreeOptions::default(), Console::default());

    println!("== inserting ==");
    for v in [50, 30, 70, 20, 40, 60, 80, 10] {
        tree.insert(v);
    }

    println!("== searching ==");
    let hit = tree.find(&60).expect("60 was inserted");
    println!("found node holding {}", tree.value(hit).unwrap());
    let _ = tree.find(&55);

    println!("== deleting ==");
    tree.delete(&30).expect("30 was inserted");
    tree.delete(&50).expect("50 was inserted");

    println!("== shape ==");
    for (depth, row) in tree.rows().iter().enumerate() {
        let values: Vec<String> = row
            .iter()
            .map(|id| tree.value(*id).unwrap().to_string())
            .collect();
        println!("tier {depth}: {}", values.join(" "));
    }

    println!("== averaged stats ==");
    for (kind, label) in [
        (OpKind::Insert, "insert"),
        (OpKind::Delete, "delete"),
        (OpKind::Search, "search"),
    ] {
        for s in tree.stats().averaged(kind) {
            println!(
                "{label}: size {:>2} -> {:.1} comparisons, {:.1} traversals",
                s.tree_size, s.comparisons, s.traversals
            );
        }
    }
}
