// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The narration boundary: how the engine talks to a presentation host.
//!
//! Every public operation on [`Tree`](crate::Tree) walks the structure in
//! small steps and reports each one to a [`Narrator`]: a line of text, the
//! node currently under consideration, a request for a presentational pause,
//! and a coarse "structure changed" signal after every attach, detach, or
//! rotation. The engine never renders, sleeps, or schedules anything itself.
//!
//! A synchronous host (tests, batch tools) can ignore pauses entirely — the
//! default [`Silent`] narrator does exactly that. An animated host maps
//! [`Pause`] hints onto real delays and typically consults a fast-forward
//! flag (see `canopy_gate`) to skip them while another operation is queued.

use crate::types::NodeId;

/// Visual weight of a narration step.
///
/// The variants mirror the highlight states an animated host typically has:
/// plain text, an in-progress accent, a success accent, and an error accent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    /// Plain narration.
    Normal,
    /// Something is in progress (the original UI's blue blink).
    Working,
    /// A positive outcome: value found, rotation pivot chosen (violet).
    Success,
    /// A failed lookup or an operation on an empty tree (red).
    Error,
}

/// Requested length class of a presentational delay.
///
/// The engine does not know about wall-clock time; it only distinguishes a
/// quick beat between comparisons, a regular step, and a longer linger on
/// results. Hosts pick concrete durations (the original used 500 ms, 1 s,
/// and 2 s respectively) or ignore the hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pause {
    /// A quick beat, e.g. right after showing a comparison.
    Short,
    /// A regular step between narration lines.
    Medium,
    /// A long linger on a final result or an error message.
    Long,
}

/// Presentation collaborator for a [`Tree`](crate::Tree).
///
/// All notifications are fire-and-forget: the engine neither observes return
/// values nor depends on the narrator doing anything at all. Implementations
/// override only what they care about; every method defaults to a no-op.
pub trait Narrator {
    /// A line of narration text with its visual weight.
    fn on_step(&mut self, text: &str, emphasis: Emphasis) {
        let _ = (text, emphasis);
    }

    /// The node currently being compared or touched gains a highlight.
    fn on_focus(&mut self, node: NodeId, emphasis: Emphasis) {
        let _ = (node, emphasis);
    }

    /// A previously focused node loses its highlight.
    fn on_blur(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Clear accumulated narration text.
    fn on_clear(&mut self) {}

    /// The engine requests a presentational delay of the given class.
    fn on_pause(&mut self, pause: Pause) {
        let _ = pause;
    }

    /// The tree structure settled after an attach, detach, or rotation;
    /// a layout collaborator should recompute placement.
    fn on_structural_change(&mut self) {}
}

/// The default narrator: ignores everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Silent;

impl Narrator for Silent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_accepts_everything() {
        let mut n = Silent;
        n.on_step("hello", Emphasis::Normal);
        n.on_focus(NodeId::new(0, 1), Emphasis::Working);
        n.on_blur(NodeId::new(0, 1));
        n.on_clear();
        n.on_pause(Pause::Long);
        n.on_structural_change();
    }
}
