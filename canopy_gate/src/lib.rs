// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Gate: exclusive admission for animated tree operations.
//!
//! An animated host runs one logical operation (insert, delete, search) at a
//! time, but users keep clicking while an animation plays. The [`Gate`]
//! serializes operations and gives queued callers a way to hurry the one in
//! flight along:
//!
//! - [`Gate::admit`] blocks until the gate is free and returns a [`Permit`];
//!   dropping the permit releases the gate, including during unwinding, so a
//!   panicking operation can never wedge the system.
//! - A caller that finds the gate busy engages a shared [`FastForward`] flag
//!   before waiting. Narrators poll it and skip presentational pauses, so
//!   the in-flight operation still performs every comparison and structural
//!   step — fast-forward is a latency short-circuit, never an abort. The
//!   flag disengages when an admitted caller sees nobody else waiting.
//! - [`Gate::finish_current_operation`] waits out the current operation
//!   (fast-forwarding it) and performs nothing itself — a flush.
//!
//! Queueing is FIFO-ish: arrival order of blocked callers is not guaranteed
//! beyond "one at a time, everyone eventually admitted".
//!
//! [`Serialized`] bundles a gate with the state it guards, which is the
//! usual way to share a `canopy_tree::Tree` between threads.
//!
//! # Example
//!
//! ```rust
//! use canopy_gate::Serialized;
//!
//! let counter = Serialized::new(0_u32);
//! let value = counter.with(|c| {
//!     *c += 1;
//!     *c
//! });
//! assert_eq!(value, 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

#[derive(Debug, Default)]
struct GateState {
    /// A permit is outstanding.
    busy: bool,
    /// Callers blocked in `admit`.
    waiting: u32,
    /// Operations past admission. Never more than one.
    inside: u32,
}

/// Admission control: at most one logical operation at a time.
///
/// See the [crate docs](crate) for the fast-forward protocol.
#[derive(Debug, Default)]
pub struct Gate {
    state: Mutex<GateState>,
    available: Condvar,
    fast: Arc<AtomicBool>,
}

impl Gate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the gate is free, then occupy it.
    ///
    /// If an operation is already in flight, the shared fast-forward flag is
    /// engaged before blocking so the in-flight operation stops dawdling.
    /// Once admitted, the flag is disengaged again — but only if no other
    /// caller is still waiting behind this one.
    ///
    /// Panics if internal accounting ever shows two callers inside at once;
    /// that is an unrecoverable logic fault, not an error to handle.
    pub fn admit(&self) -> Permit<'_> {
        let mut state = self.state.lock();
        if state.busy {
            self.fast.store(true, Ordering::Relaxed);
            state.waiting += 1;
            debug!(waiting = state.waiting, "operation in progress, waiting");
            while state.busy {
                self.available.wait(&mut state);
            }
            state.waiting -= 1;
            debug!(waiting = state.waiting, "entering operation");
        }
        if state.waiting == 0 {
            self.fast.store(false, Ordering::Relaxed);
        }
        state.busy = true;
        state.inside += 1;
        assert!(
            state.inside == 1,
            "more than one operation inside the critical section"
        );
        Permit { gate: self }
    }

    /// Wait out the operation in flight (fast-forwarding it) and return with
    /// the gate free. Performs no operation of its own; this is how a host
    /// flushes pending animation before e.g. tearing down.
    pub fn finish_current_operation(&self) {
        drop(self.admit());
    }

    /// A cloneable handle to the fast-forward flag, for narrators to poll.
    pub fn fast_forward(&self) -> FastForward {
        FastForward(Arc::clone(&self.fast))
    }

    /// Returns `true` if no operation currently holds the gate.
    pub fn is_idle(&self) -> bool {
        !self.state.lock().busy
    }
}

/// Occupancy of a [`Gate`]; dropping it releases the gate.
///
/// Release happens in `Drop`, so it also runs while unwinding from a panic
/// inside the guarded operation.
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a Gate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock();
        state.busy = false;
        state.inside -= 1;
        debug_assert!(state.inside == 0, "permit accounting out of balance");
        self.gate.available.notify_one();
    }
}

/// Shared fast-forward flag.
///
/// Narrators poll [`FastForward::engaged`] before honoring a pause request:
/// engaged means "someone is waiting — skip the delay". The flag is managed
/// entirely by the [`Gate`]; holders only read it.
#[derive(Clone, Debug)]
pub struct FastForward(Arc<AtomicBool>);

impl FastForward {
    /// Returns `true` while queued callers want the in-flight operation to
    /// skip its presentational delays.
    pub fn engaged(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gate bundled with the state it guards.
///
/// [`Serialized::with`] admits the caller, locks the state, runs the
/// closure, and releases both on the way out (normal or panicking). This is
/// the intended way to drive one `canopy_tree::Tree` from several threads.
#[derive(Debug, Default)]
pub struct Serialized<S> {
    gate: Gate,
    inner: Mutex<S>,
}

impl<S> Serialized<S> {
    /// Wrap `inner` behind a fresh gate.
    pub fn new(inner: S) -> Self {
        Self {
            gate: Gate::new(),
            inner: Mutex::new(inner),
        }
    }

    /// Run one logical operation exclusively.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let _permit = self.gate.admit();
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// See [`Gate::finish_current_operation`].
    pub fn finish_current_operation(&self) {
        self.gate.finish_current_operation();
    }

    /// See [`Gate::fast_forward`].
    pub fn fast_forward(&self) -> FastForward {
        self.gate.fast_forward()
    }

    /// The underlying gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Consume the wrapper and return the guarded state.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn permits_are_exclusive_and_sequential() {
        let gate = Arc::new(Gate::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let gate = Arc::clone(&gate);
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                let _permit = gate.admit();
                log.lock().push(("enter", i));
                thread::sleep(Duration::from_millis(5));
                log.lock().push(("exit", i));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // Every enter must be immediately followed by its own exit.
        let log = log.lock();
        assert_eq!(log.len(), 8);
        for pair in log.chunks(2) {
            assert_eq!(pair[0].0, "enter");
            assert_eq!(pair[1].0, "exit");
            assert_eq!(pair[0].1, pair[1].1, "operations interleaved");
        }
    }

    #[test]
    fn fast_forward_engages_while_waiting_and_clears_after() {
        let gate = Arc::new(Gate::new());
        let fast = gate.fast_forward();
        assert!(!fast.engaged());

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _permit = gate.admit();
                entered_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
        };
        entered_rx.recv().unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _permit = gate.admit();
                // By the time we are admitted, nobody else is waiting, so
                // the flag must have been cleared again.
                gate.fast_forward().engaged()
            })
        };

        // The queued caller engages fast-forward before blocking.
        while !fast.engaged() {
            thread::sleep(Duration::from_millis(1));
        }

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        let engaged_inside = waiter.join().unwrap();
        assert!(!engaged_inside, "flag must clear once the queue drains");
        assert!(!fast.engaged());
        assert!(gate.is_idle());
    }

    #[test]
    fn finish_current_operation_waits_for_the_holder() {
        let gate = Arc::new(Gate::new());
        let (entered_tx, entered_rx) = mpsc::channel();
        let holder = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _permit = gate.admit();
                entered_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(10));
            })
        };
        entered_rx.recv().unwrap();

        gate.finish_current_operation();
        assert!(gate.is_idle());
        holder.join().unwrap();
    }

    #[test]
    fn permit_is_released_when_an_operation_panics() {
        let gate = Gate::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _permit = gate.admit();
            panic!("operation body failed");
        }));
        assert!(result.is_err());
        // The unwind released the permit; the gate is usable again.
        assert!(gate.is_idle());
        drop(gate.admit());
    }

    #[test]
    fn serialized_runs_closures_exclusively() {
        let shared = Arc::new(Serialized::new(Vec::<u32>::new()));
        let mut handles = Vec::new();
        for i in 0..8 {
            let shared = Arc::clone(&shared);
            handles.push(thread::spawn(move || {
                shared.with(|v| {
                    v.push(i);
                    thread::sleep(Duration::from_millis(1));
                    v.push(i);
                });
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let log = shared.with(|v| v.clone());
        assert_eq!(log.len(), 16);
        for pair in log.chunks(2) {
            assert_eq!(pair[0], pair[1], "operations interleaved");
        }
    }

    /// Two threads mutating one tree through the gate: the result must be a
    /// sequential composition of both operations, and every intermediate
    /// state a caller can observe is a settled one.
    #[test]
    fn serialized_tree_composes_sequentially() {
        use canopy_tree::{Tree, TreeOptions};

        let shared = Arc::new(Serialized::new(Tree::<i32>::new(TreeOptions::default())));
        let mut handles = Vec::new();
        for chunk in [0..100, 100..200] {
            let shared = Arc::clone(&shared);
            handles.push(thread::spawn(move || {
                for v in chunk {
                    shared.with(|tree| {
                        tree.insert(v);
                        tree.assert_invariants();
                    });
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        shared.with(|tree| {
            assert_eq!(tree.len(), 200);
            tree.assert_invariants();
            tree.assert_avl_balance();
            for v in [0, 99, 100, 199] {
                assert!(tree.find(&v).is_ok());
            }
        });
    }
}
