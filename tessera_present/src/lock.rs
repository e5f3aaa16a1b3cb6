// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named exclusive lock with timeout-forced breakage.
//!
//! [`ExclusiveLock`] provides mutual exclusion for short critical sections
//! (buffer state transitions, one-time static resource loading) with
//! production diagnostics for deadlock-like situations. It deliberately does
//! not use a fair queue or condition variables: waiters poll in a ~100 ms
//! sleep loop, which behaves identically across windowing back-ends with
//! inconsistent thread-wake semantics.
//!
//! # Contract
//!
//! - At most one thread holds the lock at a time.
//! - Re-acquisition by the current owner is a programming error: the lock is
//!   released and the call panics with a diagnostic.
//! - A waiter that exceeds [`max_wait`](ExclusiveLock::max_wait) forcibly
//!   breaks the lock, captures its own stack, and proceeds. The original
//!   holder is told after the fact — a [`BreakRecord`] is returned from its
//!   next [`release`](ExclusiveLock::release) — never interrupted.
//! - `release` by a thread that is not the owner still clears the lock.
//!   This favors liveness over strictness and call sites depend on it; do
//!   not tighten it into a capability check.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, Thread, ThreadId};
use std::time::Instant;

use tessera_core::diag::{DiagSink, LockBroken, LockContended, StaleRelease};
use tessera_core::time::Span;

/// How long a waiter sleeps between acquisition attempts.
///
/// A low-overhead compromise, not a real-time guarantee; timing-sensitive
/// callers must tolerate slack of this order.
pub const POLL_INTERVAL: Span = Span(100);

/// Default wait limit before a waiter breaks the lock.
pub const DEFAULT_MAX_WAIT: Span = Span::from_secs(30);

/// Diagnostic record of a forced lock breakage.
///
/// Captured by the breaking thread and handed to the original holder on its
/// next release.
#[derive(Clone, Debug)]
pub struct BreakRecord {
    /// Name of the broken lock.
    pub lock_name: String,
    /// Name of the thread that broke the lock.
    pub breaker: String,
    /// Name of the thread that was holding the lock.
    pub victim: String,
    /// How long the breaker had been waiting.
    pub waited: Span,
    /// The breaking thread's captured stack, rendered for logging.
    pub breaker_stack: String,
}

struct PendingBreak {
    victim_id: ThreadId,
    record: BreakRecord,
}

#[derive(Default)]
struct LockState {
    owner: Option<ThreadId>,
    owner_name: String,
    waiting_name: String,
    pending_break: Option<PendingBreak>,
}

/// A named, non-reentrant mutual-exclusion primitive with owner tracking and
/// bounded-wait forced breakage.
pub struct ExclusiveLock {
    name: String,
    max_wait: Span,
    state: Mutex<LockState>,
    breaks: AtomicU64,
    contended: AtomicU64,
    sink: Option<Arc<dyn DiagSink + Send + Sync>>,
}

impl fmt::Debug for ExclusiveLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveLock")
            .field("name", &self.name)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

impl ExclusiveLock {
    /// Creates a lock with the default 30 s wait limit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_max_wait(name, DEFAULT_MAX_WAIT)
    }

    /// Creates a lock with a custom wait limit.
    #[must_use]
    pub fn with_max_wait(name: impl Into<String>, max_wait: Span) -> Self {
        Self {
            name: name.into(),
            max_wait,
            state: Mutex::new(LockState::default()),
            breaks: AtomicU64::new(0),
            contended: AtomicU64::new(0),
            sink: None,
        }
    }

    /// Attaches a diagnostic sink for contention and breakage events.
    pub fn set_sink(&mut self, sink: Arc<dyn DiagSink + Send + Sync>) {
        self.sink = Some(sink);
    }

    /// Returns the lock's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wait limit before forced breakage.
    #[must_use]
    pub fn max_wait(&self) -> Span {
        self.max_wait
    }

    /// Lock-order note: the state mutex is only ever held for a few field
    /// updates, never across a sleep or a callback.
    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts to acquire without blocking.
    ///
    /// Returns `false` when another thread holds the lock. On success the
    /// calling thread is recorded as owner.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds the lock. Recursive
    /// acquisition is never allowed; the lock is released first so the
    /// process does not deadlock on its own diagnostic.
    pub fn try_acquire(&self) -> bool {
        let me = thread::current();
        let mut st = self.state();
        match st.owner {
            Some(id) if id == me.id() => {
                st.owner = None;
                st.owner_name.clear();
                drop(st);
                panic!(
                    "recursive acquisition of lock '{}' by thread '{}'",
                    self.name,
                    thread_label(&me)
                );
            }
            Some(_) => {
                st.waiting_name = thread_label(&me);
                false
            }
            None => {
                st.owner = Some(me.id());
                st.owner_name = thread_label(&me);
                st.waiting_name.clear();
                true
            }
        }
    }

    /// Acquires the lock, polling until it is free.
    ///
    /// Waits in [`POLL_INTERVAL`] sleeps. Once the total wait exceeds
    /// [`max_wait`](Self::max_wait) the holder's transaction is declared
    /// abandoned: the lock is forcibly broken and polling continues. The
    /// wait timer restarts after each break, so losing the post-break race
    /// to a third thread earns a fresh full wait rather than an immediate
    /// second break.
    pub fn acquire_blocking(&self) {
        if self.try_acquire() {
            return;
        }

        self.contended.fetch_add(1, Ordering::Relaxed);
        if let Some(sink) = &self.sink {
            sink.on_lock_contended(&LockContended {
                lock_name: self.name.clone(),
                waiter: thread_label(&thread::current()),
            });
        }

        let mut wait_started = Instant::now();
        loop {
            if self.try_acquire() {
                return;
            }
            let waited = span_since(wait_started);
            if waited >= self.max_wait {
                self.force_break(waited);
                wait_started = Instant::now();
                continue;
            }
            thread::sleep(POLL_INTERVAL.to_duration());
        }
    }

    /// Unconditionally clears ownership, recording the breakage.
    ///
    /// The breaking thread's stack and a diagnostic are captured; the
    /// original owner receives them from its next
    /// [`release`](Self::release). A no-op when the lock is not held.
    pub fn force_break(&self, waited: Span) {
        let me = thread::current();
        let mut st = self.state();
        let Some(victim_id) = st.owner.take() else {
            return;
        };
        let record = BreakRecord {
            lock_name: self.name.clone(),
            breaker: thread_label(&me),
            victim: st.owner_name.clone(),
            waited,
            breaker_stack: Backtrace::force_capture().to_string(),
        };
        st.owner_name.clear();
        let event = LockBroken {
            lock_name: record.lock_name.clone(),
            breaker: record.breaker.clone(),
            victim: record.victim.clone(),
            waited,
        };
        st.pending_break = Some(PendingBreak { victim_id, record });
        drop(st);

        self.breaks.fetch_add(1, Ordering::Relaxed);
        if let Some(sink) = &self.sink {
            sink.on_lock_broken(&event);
        }
    }

    /// Releases the lock.
    ///
    /// Clears ownership even when the caller is not the recorded owner (a
    /// [`StaleRelease`] diagnostic is emitted instead of an error). When the
    /// caller's earlier hold was stolen by a forced break, the breakage
    /// record is returned so the caller can surface it loudly.
    pub fn release(&self) -> Option<BreakRecord> {
        let me = thread::current();
        let mut st = self.state();

        let notice = match st.pending_break.take() {
            Some(p) if p.victim_id == me.id() => Some(p.record),
            Some(p) => {
                st.pending_break = Some(p);
                None
            }
            None => None,
        };

        let had_owner = st.owner.is_some();
        let was_owner = st.owner == Some(me.id());
        st.owner = None;
        st.owner_name.clear();
        drop(st);

        if had_owner && !was_owner {
            if let Some(sink) = &self.sink {
                sink.on_stale_release(&StaleRelease {
                    lock_name: self.name.clone(),
                    releaser: thread_label(&me),
                });
            }
        }

        if let (Some(record), Some(sink)) = (&notice, &self.sink) {
            sink.on_break_noticed(&LockBroken {
                lock_name: record.lock_name.clone(),
                breaker: record.breaker.clone(),
                victim: record.victim.clone(),
                waited: record.waited,
            });
        }

        notice
    }

    /// Releases only if the calling thread is the owner; returns whether it
    /// did.
    pub fn release_if_held(&self) -> bool {
        let me = thread::current();
        let mut st = self.state();
        if st.owner == Some(me.id()) {
            st.owner = None;
            st.owner_name.clear();
            true
        } else {
            false
        }
    }

    /// Returns whether any thread currently holds the lock.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.state().owner.is_some()
    }

    /// Returns whether the calling thread holds the lock.
    #[must_use]
    pub fn held_by_current_thread(&self) -> bool {
        self.state().owner == Some(thread::current().id())
    }

    /// Returns the current holder's thread name, if held.
    #[must_use]
    pub fn holder_name(&self) -> Option<String> {
        let st = self.state();
        st.owner.is_some().then(|| st.owner_name.clone())
    }

    /// Number of forced breakages over the lock's lifetime.
    #[must_use]
    pub fn break_count(&self) -> u64 {
        self.breaks.load(Ordering::Relaxed)
    }

    /// Number of blocking acquisitions that observed contention.
    #[must_use]
    pub fn contended_count(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }
}

fn thread_label(t: &Thread) -> String {
    t.name()
        .map_or_else(|| format!("{:?}", t.id()), str::to_owned)
}

fn span_since(started: Instant) -> Span {
    Span(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn acquire_and_release() {
        let lock = ExclusiveLock::new("test");
        assert!(!lock.is_held());
        assert!(lock.try_acquire());
        assert!(lock.is_held());
        assert!(lock.held_by_current_thread());
        assert!(lock.holder_name().is_some());
        assert!(lock.release().is_none());
        assert!(!lock.is_held());
    }

    #[test]
    #[should_panic(expected = "recursive acquisition of lock 'recursive-test'")]
    fn recursive_acquisition_is_fatal() {
        let lock = ExclusiveLock::new("recursive-test");
        assert!(lock.try_acquire());
        let _ = lock.try_acquire();
    }

    #[test]
    fn contended_try_acquire_fails_until_release() {
        let lock = Arc::new(ExclusiveLock::new("contended"));
        assert!(lock.try_acquire());

        let contender = Arc::clone(&lock);
        let handle = thread::spawn(move || contender.try_acquire());
        assert!(!handle.join().expect("contender thread panicked"));

        assert!(lock.release().is_none());

        let taker = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            let got = taker.try_acquire();
            if got {
                let _ = taker.release();
            }
            got
        });
        assert!(handle.join().expect("taker thread panicked"));
    }

    #[test]
    fn forced_break_lets_the_waiter_proceed() {
        let lock = Arc::new(ExclusiveLock::with_max_wait("breakable", Span(200)));

        // The holder acquires, then parks until told to release.
        let (ready_tx, ready_rx) = mpsc::channel();
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let (notice_tx, notice_rx) = mpsc::channel();
        let holder = Arc::clone(&lock);
        let handle = thread::Builder::new()
            .name("holder".into())
            .spawn(move || {
                assert!(holder.try_acquire(), "holder should start unowned");
                ready_tx.send(()).expect("main thread went away");
                go_rx.recv().expect("main thread went away");
                notice_tx
                    .send(holder.release())
                    .expect("main thread went away");
            })
            .expect("spawn failed");
        ready_rx.recv().expect("holder thread panicked");

        // Waiter exceeds the 200ms limit, breaks the lock, and ends up owner.
        let started = Instant::now();
        lock.acquire_blocking();
        let elapsed = started.elapsed().as_millis();
        assert!(lock.held_by_current_thread(), "waiter must own after break");
        assert_eq!(lock.break_count(), 1);
        assert!(
            (200..2000).contains(&elapsed),
            "expected break after ~200-400ms of poll slack, took {elapsed}ms"
        );

        // The original holder is told after the fact, on its own release.
        go_tx.send(()).expect("holder thread panicked");
        let notice = notice_rx
            .recv()
            .expect("holder thread panicked")
            .expect("holder should receive the breakage record");
        handle.join().expect("holder thread panicked");
        assert_eq!(notice.lock_name, "breakable");
        assert_eq!(notice.victim, "holder");
        assert!(notice.waited >= Span(200), "waited {:?}", notice.waited);
        assert!(
            !notice.breaker_stack.is_empty(),
            "breaker stack should be captured"
        );

        let _ = lock.release();
    }

    // Intentionally permissive: release by a non-owner clears the lock
    // anyway. Call sites rely on this for forward progress; see the module
    // docs before tightening.
    #[test]
    fn release_by_non_owner_still_clears() {
        let lock = Arc::new(ExclusiveLock::new("permissive"));
        assert!(lock.try_acquire());

        let outsider = Arc::clone(&lock);
        thread::spawn(move || outsider.release())
            .join()
            .expect("outsider thread panicked");

        assert!(!lock.is_held(), "non-owner release must clear the lock");
        assert!(lock.try_acquire(), "lock must be acquirable again");
        let _ = lock.release();
    }

    #[test]
    fn release_if_held_checks_ownership() {
        let lock = Arc::new(ExclusiveLock::new("checked"));
        assert!(lock.try_acquire());

        let outsider = Arc::clone(&lock);
        let released = thread::spawn(move || outsider.release_if_held())
            .join()
            .expect("outsider thread panicked");
        assert!(!released, "non-owner must not release");
        assert!(lock.is_held());

        assert!(lock.release_if_held());
        assert!(!lock.is_held());
    }

    #[test]
    fn force_break_on_unheld_lock_is_a_noop() {
        let lock = ExclusiveLock::new("idle");
        lock.force_break(Span(1000));
        assert_eq!(lock.break_count(), 0);
        assert!(lock.release().is_none());
    }
}
